//! The boundary between the supervisor and the process it runs.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("service is already running")]
    AlreadyRunning,

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error("service task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

/// A long-running process the supervisor can start and stop.
///
/// `start` returns once the service is ready to serve; `stop` returns once it
/// has drained. Deadlines are applied by the caller.
#[async_trait]
pub trait Service: Send {
    async fn start(&mut self) -> Result<(), ServiceError>;

    async fn stop(&mut self) -> Result<(), ServiceError>;
}

/// Builds a fresh [`Service`] for each configuration.
pub trait ServiceFactory: Send + Sync {
    fn build(&self, config: Arc<Config>) -> Result<Box<dyn Service>, ServiceError>;
}

impl<F> ServiceFactory for F
where
    F: Fn(Arc<Config>) -> Result<Box<dyn Service>, ServiceError> + Send + Sync,
{
    fn build(&self, config: Arc<Config>) -> Result<Box<dyn Service>, ServiceError> {
        self(config)
    }
}
