//! Config redaction: render a configuration for display with secrets masked.

use crate::config::loader::ConfigError;
use crate::config::schema::Config;

/// Replacement shown for a non-empty secret.
pub const MASK: &str = "********";

/// Render the configuration as YAML.
///
/// Unless `include_secrets` is set, a non-empty database username or
/// password is replaced by [`MASK`]. Empty secrets stay empty. The caller's
/// configuration is left untouched.
pub fn render(config: &Config, include_secrets: bool) -> Result<String, ConfigError> {
    if include_secrets {
        return serde_yaml::to_string(config).map_err(ConfigError::Serialize);
    }
    serde_yaml::to_string(&redacted(config)).map_err(ConfigError::Serialize)
}

/// A copy of `config` with its secrets masked.
pub fn redacted(config: &Config) -> Config {
    let mut masked = config.clone();
    for secret in [&mut masked.database.username, &mut masked.database.password] {
        if !secret.is_empty() {
            *secret = MASK.to_string();
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_config() -> Config {
        let mut config = Config::default();
        config.log_level = "debug".into();
        config.database.host = "mongodb://ugcompsoc_apid_local_db".into();
        config.database.name = "apid".into();
        config.database.username = "test_username".into();
        config.database.password = "test_password".into();
        config
    }

    #[test]
    fn masks_secrets() {
        let yaml = render(&example_config(), false).unwrap();
        assert!(!yaml.contains("test_username"), "{yaml}");
        assert!(!yaml.contains("test_password"), "{yaml}");
        assert_eq!(yaml.matches(MASK).count(), 2, "{yaml}");
    }

    #[test]
    fn masked_output_parses_back_with_fixed_mask() {
        let yaml = render(&example_config(), false).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.database.username, MASK);
        assert_eq!(parsed.database.password, MASK);
        assert_eq!(parsed.database.name, "apid");
    }

    #[test]
    fn rendering_is_idempotent() {
        let config = example_config();
        assert_eq!(render(&config, false).unwrap(), render(&config, false).unwrap());
    }

    #[test]
    fn include_secrets_reproduces_plain_values() {
        let config = example_config();
        let yaml = render(&config, true).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_secrets_stay_empty() {
        let mut config = example_config();
        config.database.username.clear();
        config.database.password.clear();
        let masked = redacted(&config);
        assert!(masked.database.username.is_empty());
        assert!(masked.database.password.is_empty());
        assert!(!render(&config, false).unwrap().contains(MASK));
    }

    #[test]
    fn caller_config_is_not_mutated() {
        let config = example_config();
        let _ = render(&config, false).unwrap();
        assert_eq!(config.database.username, "test_username");
    }
}
