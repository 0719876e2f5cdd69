//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS, tracing, panic recovery)
//!     → /v2 handlers
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpService;
