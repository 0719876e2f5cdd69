//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - One check per section: log level, timeouts, HTTP, database
//! - Report every problem as a human-readable issue
//!
//! # Design Decisions
//! - Never fails fast: all sections are checked and their issues concatenated
//!   in the order log level, timeouts, HTTP, database
//! - User mistakes are issues; `Err` is reserved for broken built-in patterns

use regex::Regex;
use thiserror::Error;

use crate::config::schema::{Config, DatabaseConfig, HttpConfig, Level, TimeoutConfig};

/// Domain pattern shared by origins and the database host.
///
/// The label separator is an unescaped `.`, so underscore-joined container
/// names such as `ugcompsoc_apid_local_db` are accepted as hosts.
const DOMAIN_PATTERN: &str = "([a-z0-9]+(-[a-z0-9]+)*.)+[a-z]{2,}";

const TIMEOUT_PATTERN: &str = "^[0-9]{1,2}s$";

/// Minimum length, in bytes, of the database name and credentials.
pub const MIN_DATABASE_FIELD_LEN: usize = 3;

/// Internal validation failure. Never caused by user input.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("built-in validation pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Run every check and return all issues in a fixed order.
pub fn verify(config: &Config) -> Result<Vec<String>, VerifyError> {
    let mut issues = verify_log_level(config);
    issues.extend(verify_timeouts(&config.timeouts)?);
    issues.extend(verify_http(&config.http)?);
    issues.extend(verify_database(&config.database)?);
    Ok(issues)
}

pub fn verify_log_level(config: &Config) -> Vec<String> {
    if config.level() == Level::NoLevel {
        vec!["An invalid log level was specified".to_string()]
    } else {
        Vec::new()
    }
}

/// Timeouts must be a whole number of seconds below one minute, e.g. `30s`.
///
/// The check is made against the humantime rendering of the duration, so
/// `2m` and `1s 500ms` are rejected even though they are positive, and `0s`
/// is rejected explicitly.
pub fn verify_timeouts(timeouts: &TimeoutConfig) -> Result<Vec<String>, VerifyError> {
    let pattern = Regex::new(TIMEOUT_PATTERN)?;
    let mut issues = Vec::new();

    for (name, duration) in [("Startup", timeouts.startup), ("Shutdown", timeouts.shutdown)] {
        let rendered = humantime::format_duration(duration).to_string();
        if !pattern.is_match(&rendered) || rendered == "0s" {
            issues.push(format!(
                "{name} timeout should be represented in the form '{{int}}s', e.g. '30s'"
            ));
        }
    }

    Ok(issues)
}

pub fn verify_http(http: &HttpConfig) -> Result<Vec<String>, VerifyError> {
    let mut issues = Vec::new();

    if split_host_port(&http.listen_address).is_none() {
        issues.push("HTTP listen address is not valid".to_string());
    }

    let origin_pattern = Regex::new(&format!("^(?:https?://)?{DOMAIN_PATTERN}$"))?;
    if http.cors.allowed_origins.is_empty() {
        issues.push("No allowed origins specified".to_string());
    }
    for origin in &http.cors.allowed_origins {
        if origin != "*" && !origin_pattern.is_match(origin) {
            issues.push(format!("The allowed origin {origin} is invalid"));
        }
    }

    Ok(issues)
}

pub fn verify_database(database: &DatabaseConfig) -> Result<Vec<String>, VerifyError> {
    let host_pattern = Regex::new(&format!("^mongodb://{DOMAIN_PATTERN}$"))?;
    let mut issues = Vec::new();

    if !host_pattern.is_match(&database.host) {
        issues.push("Mongo host is not valid".to_string());
    }

    for (field, value) in [
        ("name", &database.name),
        ("username", &database.username),
        ("password", &database.password),
    ] {
        if value.len() < MIN_DATABASE_FIELD_LEN {
            issues.push(format!("Mongo database {field} is not long enough"));
        }
    }

    Ok(issues)
}

/// Split `host:port` the way Go's `net.SplitHostPort` does.
///
/// The host may be empty (`:8080`) or a bracketed IPv6 literal
/// (`[::1]:8080`); an unbracketed host may not contain a colon.
pub fn split_host_port(address: &str) -> Option<(&str, &str)> {
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        if port.contains([':', '[', ']']) {
            return None;
        }
        return Some((host, port));
    }

    let (host, port) = address.rsplit_once(':')?;
    if host.contains([':', '[', ']']) || port.contains(['[', ']']) {
        return None;
    }
    Some((host, port))
}
