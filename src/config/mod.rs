//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → apid.yml (loader.rs, parse & deserialize)
//!     → flags / APID_* env overrides (loader.rs)
//!     → Config (immutable, shared as Arc<Config>)
//!
//! CLI path:      Config → validation.rs → issues printed → redact.rs for display
//! Service path:  Config → validation.rs (warnings only) → Supervisor
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads a new Config
//!     → Supervisor stops the old service and starts a new one
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation collects every issue instead of stopping at the first

pub mod loader;
pub mod redact;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{verify_filename, ConfigError, ConfigOverrides, ConfigSource};
pub use redact::render;
pub use schema::{Config, CorsConfig, DatabaseConfig, HttpConfig, Level, TimeoutConfig};
pub use validation::{verify, VerifyError};
pub use watcher::ConfigWatcher;
