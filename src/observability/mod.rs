//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Rewrite middleware produces:
//!     → events.rs (typed diagnostics through RewriteObserver)
//!         → TracingObserver → debug log lines with JSON payloads
//!
//! All subsystems produce:
//!     → logging.rs (structured log events, env-filtered)
//! ```
//!
//! # Design Decisions
//! - Diagnostics are an injected observer, not a global emitter
//! - Structured fields on every log line

pub mod events;
pub mod logging;

pub use events::{NoopObserver, RewriteObserver, TracingObserver};
