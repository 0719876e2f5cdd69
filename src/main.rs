use std::path::PathBuf;

use clap::Parser;

use apid::config::loader::DEFAULT_FILENAME;
use apid::config::{verify, Config, ConfigError, ConfigOverrides, ConfigSource, ConfigWatcher};
use apid::http::HttpService;
use apid::lifecycle::{signals, supervise, Shutdown, Supervisor};
use apid::observability;

#[derive(Debug, Parser)]
#[command(name = "apid", version, about = "The apid HTTP API service")]
struct Args {
    /// Overrides log_level from the config file
    #[arg(short, long, env = "APID_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory searched for the config file; repeat to search several
    #[arg(short = 'c', long = "config-dir", env = "APID_CONFIG_DIR", value_delimiter = ',')]
    config_dirs: Vec<PathBuf>,

    #[arg(short = 'f', long, env = "APID_CONFIG_FILE", default_value = DEFAULT_FILENAME)]
    config_file: String,

    /// Overrides http.listen_address from the config file
    #[arg(long, env = "APID_LISTEN_ADDRESS")]
    listen_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let source = ConfigSource::new()
        .with_directories(args.config_dirs)
        .with_filename(args.config_file)
        .with_overrides(ConfigOverrides {
            log_level: args.log_level,
            listen_address: args.listen_address,
        });

    let (path, found) = match source.locate() {
        Ok(path) => (path, true),
        Err(ConfigError::NotFound { path }) => (path, false),
        Err(e) => return Err(e.into()),
    };
    let (config, load_error) = if found {
        match source.load_from(&path) {
            Ok(config) => (config, None),
            Err(e) => (source.defaults(), Some(e)),
        }
    } else {
        (source.defaults(), None)
    };

    let log = observability::init_logging(config.level())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "apid starting");
    match (found, load_error) {
        (false, _) => tracing::warn!(
            filename = %source.filename(),
            directories = ?source.directories(),
            "No config file found, using defaults"
        ),
        (true, Some(e)) => tracing::warn!(error = %e, "Failed to load config, using defaults"),
        (true, None) => tracing::info!(path = %path.display(), "Configuration loaded"),
    }
    report_issues(&config);

    let supervisor = Supervisor::new(HttpService::factory);
    if let Err(e) = supervisor.start(config).await {
        tracing::error!(error = %e, "Failed to start server");
        return Err(e.into());
    }

    let (watcher, updates) = ConfigWatcher::new(source, &path);
    let _file_watch = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Config watcher not started");
            None
        }
    };
    tokio::spawn(signals::hangups(watcher));

    let shutdown = Shutdown::new();
    signals::spawn_terminate(shutdown.clone());

    let result = supervise(&supervisor, updates, shutdown.wait(), |config| {
        log.set_level(config.level());
        report_issues(config);
    })
    .await;

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Server could not be restarted or stopped in time");
            Err(e.into())
        }
    }
}

/// The service runs with any config it can parse; problems are only logged.
fn report_issues(config: &Config) {
    match verify(config) {
        Ok(issues) => {
            for issue in issues {
                tracing::warn!(issue = %issue, "Config issue");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not verify config"),
    }
}
