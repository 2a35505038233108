//! URL rewriting middleware.
//!
//! # Data Flow
//! ```text
//! Middleware construction (once):
//!     rule strings ["/from -> /to", "/api -> http://host/api"]
//!     → rule.rs (parse into Route records)
//!     → dispatch.rs (route.to has a host? proxy handler : local handler)
//!     → observer.on_config(routes)
//!
//! Per request (layer.rs):
//!     Request
//!     → local.rs    (path matches? rewrite URI, continue)
//!     → proxy.rs    (path matches? stream to remote host, respond)
//!     → inner service (serves the possibly rewritten path)
//! ```
//!
//! # Design Decisions
//! - Rules without a destination are skipped, not fatal
//! - Handlers run in configuration order
//! - Diagnostics go to an injected `RewriteObserver`

pub mod dispatch;
pub mod handler;
pub mod layer;
pub mod local;
pub mod pattern;
pub mod proxy;
pub mod rule;

pub use dispatch::Dispatcher;
pub use handler::{HandlerKind, Outcome, RouteHandler};
pub use layer::{RewriteLayer, RewriteService};
pub use pattern::{Captures, PathPattern};
pub use rule::{parse_rules, Route, Target};

/// Errors raised while building the rewrite middleware.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
