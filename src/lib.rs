//! apid: the HTTP API service and its configuration lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!   apid.yml ──▶ config::loader ──▶ Config ──▶ lifecycle::Supervisor ──▶ http::HttpService
//!      ▲              ▲                │                 ▲
//!      │              │                ▼                 │
//!   notify      flags / APID_*   config::validation   config::watcher / SIGHUP
//!                                 config::redact
//!
//!   apid-manager ──▶ manager (config, config create)
//! ```

// Core subsystems
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

// Tooling
pub mod manager;

pub use config::Config;
pub use http::HttpService;
pub use lifecycle::{Shutdown, Supervisor};
