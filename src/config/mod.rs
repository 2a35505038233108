//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)            CLI (--rewrite, --port, ...)
//!     → loader.rs (parse)           │
//!     → ServerConfig  ◀─────────────┘ (main.rs merges overrides)
//!     → validation.rs (semantic checks)
//!     → shared with the server and the rewrite middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; rules are parsed once at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RewriteConfig;
pub use schema::ServerConfig;
pub use validation::{validate_config, ValidationError};
