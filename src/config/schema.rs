//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for (de)serialization from the YAML file, and
//! every section falls back to its defaults for keys the file leaves out.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Root configuration for the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Log level name (trace, disabled, panic, fatal, error, warn, info, debug).
    pub log_level: String,

    /// Startup and shutdown budgets for the supervised service.
    pub timeouts: TimeoutConfig,

    /// HTTP listener settings.
    pub http: HttpConfig,

    /// MongoDB connection settings.
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            timeouts: TimeoutConfig::default(),
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Map the configured log level name onto a [`Level`].
    pub fn level(&self) -> Level {
        Level::parse(&self.log_level)
    }
}

/// Timeout configuration for the service lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the service to become ready.
    #[serde(with = "humantime_duration")]
    pub startup: Duration,

    /// Time allowed for the service to drain and stop.
    #[serde(with = "humantime_duration")]
    pub shutdown: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            startup: Duration::from_secs(30),
            shutdown: Duration::from_secs(30),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address in `host:port` form; an empty host binds every interface.
    pub listen_address: String,

    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: ":8080".to_string(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API. `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// MongoDB configuration. Username and password are secrets.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URI, e.g. `mongodb://db.example.com`.
    pub host: String,
    pub name: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("username", &mask(&self.username))
            .field("password", &mask(&self.password))
            .finish()
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        crate::config::redact::MASK
    }
}

/// Log levels accepted in the `log_level` key.
///
/// `NoLevel` is the sentinel for anything unrecognised, including the empty
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
    Disabled,
    NoLevel,
}

impl Level {
    /// Parse a level name. Matching is exact and case-sensitive.
    pub fn parse(name: &str) -> Self {
        match name {
            "trace" => Level::Trace,
            "disabled" => Level::Disabled,
            "panic" => Level::Panic,
            "fatal" => Level::Fatal,
            "error" => Level::Error,
            "warn" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            _ => Level::NoLevel,
        }
    }

    /// The tracing filter for this level, or `None` for `NoLevel`.
    ///
    /// tracing has no fatal or panic levels, so both collapse into `ERROR`.
    pub fn filter(self) -> Option<LevelFilter> {
        match self {
            Level::Trace => Some(LevelFilter::TRACE),
            Level::Debug => Some(LevelFilter::DEBUG),
            Level::Info => Some(LevelFilter::INFO),
            Level::Warn => Some(LevelFilter::WARN),
            Level::Error | Level::Fatal | Level::Panic => Some(LevelFilter::ERROR),
            Level::Disabled => Some(LevelFilter::OFF),
            Level::NoLevel => None,
        }
    }
}

/// Serde adapter storing durations as humantime strings such as `30s`.
pub(crate) mod humantime_duration {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_levels_can_be_converted() {
        let cases = [
            ("trace", Level::Trace),
            ("disabled", Level::Disabled),
            ("panic", Level::Panic),
            ("fatal", Level::Fatal),
            ("error", Level::Error),
            ("warn", Level::Warn),
            ("info", Level::Info),
            ("debug", Level::Debug),
        ];
        for (name, expected) in cases {
            let config = Config {
                log_level: name.to_string(),
                ..Config::default()
            };
            assert_eq!(config.level(), expected, "level {name}");
        }
    }

    #[test]
    fn unknown_levels_map_to_no_level() {
        for name in ["dummy", "", "INFO", " info"] {
            assert_eq!(Level::parse(name), Level::NoLevel, "level {name:?}");
        }
        assert_eq!(Level::NoLevel.filter(), None);
    }

    #[test]
    fn fatal_and_panic_filter_as_error() {
        assert_eq!(Level::Fatal.filter(), Some(LevelFilter::ERROR));
        assert_eq!(Level::Panic.filter(), Some(LevelFilter::ERROR));
        assert_eq!(Level::Disabled.filter(), Some(LevelFilter::OFF));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.timeouts.startup, Duration::from_secs(30));
        assert_eq!(config.timeouts.shutdown, Duration::from_secs(30));
        assert_eq!(config.http.listen_address, ":8080");
        assert_eq!(config.http.cors.allowed_origins, vec!["*".to_string()]);
        assert!(config.database.username.is_empty());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str(
            "timeouts:\n  startup: 10s\ndatabase:\n  name: apid\n",
        )
        .unwrap();
        assert_eq!(config.timeouts.startup, Duration::from_secs(10));
        assert_eq!(config.timeouts.shutdown, Duration::from_secs(30));
        assert_eq!(config.database.name, "apid");
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn durations_serialize_as_text() {
        let yaml = serde_yaml::to_string(&TimeoutConfig::default()).unwrap();
        assert!(yaml.contains("startup: 30s"), "{yaml}");
        assert!(yaml.contains("shutdown: 30s"), "{yaml}");
    }

    #[test]
    fn malformed_duration_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("timeouts:\n  startup: soon\n");
        assert!(result.is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let database = DatabaseConfig {
            host: "mongodb://db.example.com".into(),
            name: "apid".into(),
            username: "admin".into(),
            password: "hunter22".into(),
        };
        let rendered = format!("{database:?}");
        assert!(!rendered.contains("admin"));
        assert!(!rendered.contains("hunter22"));
        assert!(rendered.contains("db.example.com"));
    }
}
