use std::io::{self, Write};
use std::process::ExitCode;

use apid::config::Level;
use apid::manager::{self, Cli, Outcome};
use apid::observability;
use clap::Parser;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.debug {
        observability::init_logging(Level::Debug)?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = manager::run(&cli, &mut out)?;
    out.flush()?;

    Ok(match outcome {
        Outcome::Ok => ExitCode::SUCCESS,
        Outcome::Failed => ExitCode::FAILURE,
    })
}
