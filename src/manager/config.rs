//! `config` and `config create` commands.

use std::io::{self, Write};

use crate::config::loader::{load_file, write_file};
use crate::config::{render, verify, verify_filename, Config, ConfigError};
use crate::manager::{fail, itemize, ConfigArgs, CreateArgs, Outcome};

/// Check the config file named by `args` and report the result.
pub fn verify_config(args: &ConfigArgs, debug: bool, out: &mut dyn Write) -> io::Result<Outcome> {
    if let Err(e) = verify_filename(&args.filename) {
        return fail(out, debug, &e, &e.to_string());
    }

    let path = args.directory.join(&args.filename);
    let config = match load_file(&path) {
        Ok(config) => config,
        Err(e @ (ConfigError::NotFound { .. } | ConfigError::Empty { .. })) => {
            return fail(out, debug, &e, &e.to_string());
        }
        Err(ConfigError::Io { source, .. }) => {
            let message = format!("No file exists at path: {}", path.display());
            return fail(out, debug, &source, &message);
        }
        Err(e) => {
            return fail(out, debug, &e, "An error was encountered while verifying the file");
        }
    };

    let issues = match verify(&config) {
        Ok(issues) => issues,
        Err(e) => return fail(out, debug, &e, "An error occurred while verifying the config"),
    };
    if !issues.is_empty() {
        let header = format!(
            "Error(s) were found while parsing {}, view them below and address them",
            args.filename
        );
        return itemize(out, &header, &issues);
    }

    writeln!(out, "OK")?;
    print_config(args, &config, debug, out)
}

/// Build a config from flags, verify it and write it into `args.directory`.
pub fn create_config(
    args: &ConfigArgs,
    create: &CreateArgs,
    debug: bool,
    out: &mut dyn Write,
) -> io::Result<Outcome> {
    let (config, issues) = config_from_flags(create);
    if !issues.is_empty() {
        return itemize(
            out,
            "Error(s) were found while generating the config, please address them:",
            &issues,
        );
    }

    if let Err(e) = verify_filename(&args.filename) {
        let message = format!("An error occurred while verifying the filename: {e}");
        return fail(out, debug, &e, &message);
    }
    let path = args.directory.join(&args.filename);

    let issues = match verify(&config) {
        Ok(issues) => issues,
        Err(e) => {
            let message = format!("An error occurred while verifying the config: {e}");
            return fail(out, debug, &e, &message);
        }
    };
    if !issues.is_empty() {
        let header = format!(
            "Error(s) were found while parsing {}, please address them:",
            path.display()
        );
        return itemize(out, &header, &issues);
    }

    if let Err(e) = write_file(&path, &config) {
        return fail(out, debug, &e, &e.to_string());
    }

    writeln!(out, "OK")?;
    print_config(args, &config, debug, out)
}

/// Assemble a config from `config create` flags.
///
/// Unparseable durations and missing credentials are returned as issues;
/// their fields keep the default values.
fn config_from_flags(create: &CreateArgs) -> (Config, Vec<String>) {
    let mut config = Config::default();
    let mut issues = Vec::new();

    config.log_level = create.log_level.clone();
    match humantime::parse_duration(&create.timeouts_startup) {
        Ok(duration) => config.timeouts.startup = duration,
        Err(_) => issues.push("Could not parse startup timeout. Use the format '[NUMBER]s'".to_string()),
    }
    match humantime::parse_duration(&create.timeouts_shutdown) {
        Ok(duration) => config.timeouts.shutdown = duration,
        Err(_) => issues.push("Could not parse shutdown timeout. Use the format '[NUMBER]s'".to_string()),
    }
    config.http.listen_address = create.http_listen_address.clone();
    config.http.cors.allowed_origins = create.http_cors_allowed_origins.clone();
    config.database.host = create.database_host.clone();
    config.database.name = create.database_name.clone();
    config.database.username = create.database_username.clone();
    config.database.password = create.database_password.clone();

    if config.database.username.is_empty() {
        issues.push("Database username has no default value and is required".to_string());
    }
    if config.database.password.is_empty() {
        issues.push("Database password has no default value and is required".to_string());
    }

    (config, issues)
}

fn print_config(
    args: &ConfigArgs,
    config: &Config,
    debug: bool,
    out: &mut dyn Write,
) -> io::Result<Outcome> {
    if !args.print {
        return Ok(Outcome::Ok);
    }
    match render(config, args.secrets) {
        Ok(yaml) => {
            write!(out, "\n{yaml}")?;
            Ok(Outcome::Ok)
        }
        Err(e) => fail(out, debug, &e, "An error occurred while attempting to print the config"),
    }
}
