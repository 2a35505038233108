//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer)
//!     → rewrite::RewriteService (local rewrite / proxy dispatch)
//!     → site router (ServeDir, timeout) with the rewritten path
//!     → Send to client
//! ```

pub mod server;

pub use server::{with_rewrites, DevServer};
