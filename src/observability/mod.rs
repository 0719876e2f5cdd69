//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (filter by configured level, format to stdout)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span (see `http::server`)
//! - The level follows the configuration across reloads

pub mod logging;

pub use logging::{init as init_logging, LogHandle};
