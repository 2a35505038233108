//! URL rewriting middleware and development server.
//!
//! Rewrite rules (`"/from -> /to"`) route requests either to another local
//! path or, when the destination is an absolute URL, to a remote host.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::schema::ServerConfig;
pub use http::DevServer;
pub use lifecycle::Shutdown;
pub use rewrite::{Dispatcher, RewriteLayer};
