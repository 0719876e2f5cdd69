//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor (supervisor.rs):
//!     Config → ServiceFactory builds Service → start within startup timeout
//!     Reload: stop within shutdown timeout → start with the new Config
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Shutdown triggered → Supervisor stops the service → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//! ```
//!
//! # Design Decisions
//! - At most one service is live at any moment
//! - Every phase is bounded by a configured timeout
//! - A service that misses a deadline leaves the supervisor failed

pub mod service;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use service::{Service, ServiceError, ServiceFactory};
pub use shutdown::Shutdown;
pub use supervisor::{supervise, Supervisor, SupervisorError, SupervisorState};
