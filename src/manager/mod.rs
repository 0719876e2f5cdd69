//! Management CLI for apid deployments.
//!
//! # Data Flow
//! ```text
//! argv → Cli (clap)
//!     config        → load file → verify → itemized issues | OK (+ redacted YAML)
//!     config create → flags → Config → verify → write file → OK (+ redacted YAML)
//! ```
//!
//! # Design Decisions
//! - Commands write to any `io::Write`, so tests capture output in a buffer
//! - Every failure is reported as text; the binary maps [`Outcome`] to the
//!   exit status

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::loader::DEFAULT_FILENAME;

pub mod config;

pub use config::{create_config, verify_config};

#[derive(Debug, Parser)]
#[command(name = "apid-manager")]
#[command(about = "A CLI to manage apid deployments", long_about = None)]
pub struct Cli {
    /// Show the underlying error alongside each failure
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify a config file, optionally printing it
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Directory for config
    #[arg(short, long, default_value = ".", global = true)]
    pub directory: PathBuf,

    /// Filename for config
    #[arg(short, long, default_value = DEFAULT_FILENAME, global = true)]
    pub filename: String,

    /// Print config
    #[arg(short, long, global = true)]
    pub print: bool,

    /// Print secrets
    #[arg(short, long, global = true)]
    pub secrets: bool,

    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Create a config file from flags in the given directory
    Create(CreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Log level; one of trace, disabled, panic, fatal, error, warn, info, debug
    #[arg(long, default_value = "debug")]
    pub log_level: String,

    /// Startup timeout
    #[arg(long, default_value = "30s")]
    pub timeouts_startup: String,

    /// Shutdown timeout
    #[arg(long, default_value = "30s")]
    pub timeouts_shutdown: String,

    /// HTTP listen address in the form 'IP/DOMAIN:PORT'
    #[arg(long, default_value = ":8080")]
    pub http_listen_address: String,

    /// HTTP CORS allowed origins, comma separated
    #[arg(long, value_delimiter = ',', default_value = "*")]
    pub http_cors_allowed_origins: Vec<String>,

    #[arg(long, default_value = "mongodb://ugcompsoc_apid_local_db")]
    pub database_host: String,

    #[arg(long, default_value = "apid")]
    pub database_name: String,

    #[arg(long)]
    pub database_username: String,

    #[arg(long)]
    pub database_password: String,
}

/// Result of a command, independent of what was printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `OK` was printed.
    Ok,
    /// Issues or an error were printed.
    Failed,
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli, out: &mut dyn Write) -> io::Result<Outcome> {
    match &cli.command {
        Command::Config(args) => match &args.action {
            None => verify_config(args, cli.debug, out),
            Some(ConfigAction::Create(create)) => create_config(args, create, cli.debug, out),
        },
    }
}

/// Print `message`, preceded by the underlying error in debug mode.
fn fail(
    out: &mut dyn Write,
    debug: bool,
    err: &dyn std::error::Error,
    message: &str,
) -> io::Result<Outcome> {
    if debug {
        writeln!(out, "Error: {err}")?;
    }
    writeln!(out, "{message}")?;
    Ok(Outcome::Failed)
}

fn itemize(out: &mut dyn Write, header: &str, issues: &[String]) -> io::Result<Outcome> {
    writeln!(out, "{header}")?;
    for issue in issues {
        writeln!(out, "  - {issue}")?;
    }
    Ok(Outcome::Failed)
}
