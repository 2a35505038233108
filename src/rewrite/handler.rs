//! Common interface for per-route request handlers.

use std::fmt;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::rewrite::rule::Route;

/// What a handler decided to do with a request.
pub enum Outcome {
    /// Pass the (possibly rewritten) request to the next handler.
    Continue(Request<Body>),
    /// The handler answers the request itself.
    Respond(BoxFuture<'static, Response>),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Continue(req) => f.debug_tuple("Continue").field(req.uri()).finish(),
            Outcome::Respond(_) => f.write_str("Respond(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Rewrites the path in-process.
    Local,
    /// Forwards to a remote host.
    Proxy,
}

/// A handler bound to one route, built once at middleware construction.
pub trait RouteHandler: Send + Sync + fmt::Debug {
    /// The route this handler was built from.
    fn route(&self) -> &Route;

    fn kind(&self) -> HandlerKind;

    /// Inspect a request. Non-matching requests must come back unchanged.
    fn handle(&self, req: Request<Body>) -> Outcome;
}
