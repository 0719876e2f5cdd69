//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Map the configured log level onto a tracing filter
//! - Change the level at runtime when the configuration reloads
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the config file when set, and is never overridden
//! - Unknown level names leave logging at `info`

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, util::TryInitError, EnvFilter,
    Registry,
};

use crate::config::Level;

/// Handle for adjusting the log level after [`init`].
#[derive(Clone)]
pub struct LogHandle {
    reload: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogHandle {
    /// Apply `level` to the running subscriber.
    ///
    /// A no-op when the filter came from `RUST_LOG`.
    pub fn set_level(&self, level: Level) {
        let Some(handle) = &self.reload else {
            return;
        };
        if let Err(e) = handle.reload(filter_for(level)) {
            tracing::warn!(error = %e, "Failed to change log level");
        } else {
            tracing::debug!(level = %level_filter(level), "Log level changed");
        }
    }

    /// Whether the level follows the configuration.
    pub fn is_reloadable(&self) -> bool {
        self.reload.is_some()
    }
}

/// Install the global subscriber.
pub fn init(level: Level) -> Result<LogHandle, TryInitError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()?;
        return Ok(LogHandle { reload: None });
    }

    let (filter, handle) = reload::Layer::new(filter_for(level));
    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    Ok(LogHandle {
        reload: Some(handle),
    })
}

fn level_filter(level: Level) -> LevelFilter {
    level.filter().unwrap_or(LevelFilter::INFO)
}

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(level_filter(level).into())
}
