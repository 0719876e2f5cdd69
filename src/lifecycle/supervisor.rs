//! Service supervisor: owns the single live service and restarts it on
//! configuration changes.
//!
//! # States
//! ```text
//! Idle → Starting → Running → Stopping → Idle
//!           ↓                     ↓
//!         Failed               Failed
//! ```
//!
//! # Design Decisions
//! - Every transition runs under one async mutex, so a reload racing another
//!   reload or a termination is serialized rather than interleaved
//! - A reload's stop completes (or times out) before its start begins
//! - Timeouts abort only the phase they bound; nothing is retried
//! - `Failed` is terminal: the process entry point decides whether to exit

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};

use crate::config::Config;
use crate::lifecycle::service::{Service, ServiceError, ServiceFactory};

/// Observable supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// Error type for supervisor transitions.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to build service: {0}")]
    Build(#[source] ServiceError),

    #[error("failed to start service: {0}")]
    Start(#[source] ServiceError),

    #[error("service did not start within {}", human(.0))]
    StartupTimeout(Duration),

    #[error("failed to stop service: {0}")]
    Stop(#[source] ServiceError),

    #[error("service did not stop within {}", human(.0))]
    ShutdownTimeout(Duration),

    #[error("a service is already running")]
    AlreadyRunning,

    #[error("supervisor has failed and will not start another service")]
    Failed,

    #[error("supervisor has been shut down")]
    Closed,
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

struct Current {
    service: Box<dyn Service>,
    config: Arc<Config>,
}

#[derive(Default)]
struct Inner {
    current: Option<Current>,
    closed: bool,
}

/// Owns at most one running [`Service`].
///
/// Construct it once at process start and share it by `Arc` with whatever
/// needs to trigger a reload or shutdown.
pub struct Supervisor {
    factory: Box<dyn ServiceFactory>,
    inner: Mutex<Inner>,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(factory: impl ServiceFactory + 'static) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);
        Self {
            factory: Box::new(factory),
            inner: Mutex::new(Inner::default()),
            state,
        }
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Configuration of the running service, if any.
    pub async fn current_config(&self) -> Option<Arc<Config>> {
        let inner = self.inner.lock().await;
        inner.current.as_ref().map(|current| Arc::clone(&current.config))
    }

    /// Build a service from `config` and start it within its startup timeout.
    pub async fn start(&self, config: Config) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;
        if inner.current.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }
        self.start_locked(&mut inner, config).await
    }

    /// Stop the running service within its shutdown timeout.
    ///
    /// Stopping an idle supervisor does nothing.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        self.stop_locked(&mut inner).await
    }

    /// Replace the running service with one built from `config`.
    ///
    /// The old service is fully stopped before the new one is built, so both
    /// never hold the listen address at once.
    pub async fn reload(&self, config: Config) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        self.ensure_open(&inner)?;
        self.stop_locked(&mut inner).await?;
        self.start_locked(&mut inner, config).await
    }

    /// Stop the running service and refuse any later start or reload.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        self.stop_locked(&mut inner).await
    }

    fn ensure_open(&self, inner: &Inner) -> Result<(), SupervisorError> {
        if inner.closed {
            return Err(SupervisorError::Closed);
        }
        if self.state() == SupervisorState::Failed {
            return Err(SupervisorError::Failed);
        }
        Ok(())
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state.send_replace(state);
        tracing::debug!(from = ?previous, to = ?state, "Supervisor state changed");
    }

    async fn start_locked(&self, inner: &mut Inner, config: Config) -> Result<(), SupervisorError> {
        let config = Arc::new(config);
        let startup = config.timeouts.startup;
        self.set_state(SupervisorState::Starting);

        let mut service = match self.factory.build(Arc::clone(&config)) {
            Ok(service) => service,
            Err(e) => {
                self.set_state(SupervisorState::Failed);
                return Err(SupervisorError::Build(e));
            }
        };

        tracing::info!(
            listen_address = %config.http.listen_address,
            timeout = %humantime::format_duration(startup),
            "Starting server"
        );
        match tokio::time::timeout(startup, service.start()).await {
            Ok(Ok(())) => {
                inner.current = Some(Current { service, config });
                self.set_state(SupervisorState::Running);
                tracing::info!("Server started");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::Start(e))
            }
            Err(_) => {
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::StartupTimeout(startup))
            }
        }
    }

    async fn stop_locked(&self, inner: &mut Inner) -> Result<(), SupervisorError> {
        let Some(mut current) = inner.current.take() else {
            return Ok(());
        };
        let shutdown = current.config.timeouts.shutdown;
        self.set_state(SupervisorState::Stopping);

        tracing::info!(timeout = %humantime::format_duration(shutdown), "Stopping server");
        let result = tokio::time::timeout(shutdown, current.service.stop()).await;
        // Dropping the service releases whatever it still holds, even after a
        // timed-out stop.
        drop(current);

        match result {
            Ok(Ok(())) => {
                self.set_state(SupervisorState::Idle);
                tracing::info!("Stopped server successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::Stop(e))
            }
            Err(_) => {
                self.set_state(SupervisorState::Failed);
                Err(SupervisorError::ShutdownTimeout(shutdown))
            }
        }
    }
}

/// Drive the supervisor until `terminate` resolves.
///
/// Each configuration received from `updates` triggers a reload; updates that
/// queued up while a reload was running are coalesced into the newest one,
/// and one equal to the running configuration is skipped.
/// `on_config` sees every configuration before it is applied. A failed reload
/// ends the loop with its error. Termination performs [`Supervisor::shutdown`].
pub async fn supervise<T, F>(
    supervisor: &Supervisor,
    mut updates: mpsc::UnboundedReceiver<Config>,
    terminate: T,
    mut on_config: F,
) -> Result<(), SupervisorError>
where
    T: Future<Output = ()>,
    F: FnMut(&Config),
{
    tokio::pin!(terminate);
    let mut watching = true;

    loop {
        tokio::select! {
            biased;
            _ = &mut terminate => {
                tracing::info!("Termination requested");
                return supervisor.shutdown().await;
            }
            update = updates.recv(), if watching => match update {
                Some(mut config) => {
                    while let Ok(newer) = updates.try_recv() {
                        config = newer;
                    }
                    let current = supervisor.current_config().await;
                    if current.as_deref() == Some(&config) {
                        tracing::debug!("Config unchanged, keeping the running server");
                    } else {
                        on_config(&config);
                        supervisor.reload(config).await?;
                    }
                }
                None => {
                    tracing::debug!("Config updates closed; waiting for termination");
                    watching = false;
                }
            },
        }
    }
}
