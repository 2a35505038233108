//! In-process path rewriting.
//!
//! # Responsibilities
//! - Match the request path against the route's `from` pattern
//! - Replace the request URI with the expanded destination
//! - Report the rewrite to the observer
//!
//! # Design Decisions
//! - Never answers the request: the rewritten request continues down the chain
//! - An expansion that is not a valid URI leaves the request untouched

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Uri};

use crate::observability::events::{LocalRewriteEvent, RewriteObserver};
use crate::rewrite::handler::{HandlerKind, Outcome, RouteHandler};
use crate::rewrite::pattern::PathPattern;
use crate::rewrite::rule::Route;

pub struct LocalRewrite {
    route: Route,
    pattern: PathPattern,
    to: String,
    observer: Arc<dyn RewriteObserver>,
}

impl LocalRewrite {
    pub fn new(route: Route, to: String, observer: Arc<dyn RewriteObserver>) -> Self {
        Self {
            pattern: PathPattern::new(&route.from),
            route,
            to,
            observer,
        }
    }

    /// Compute the rewritten URI for a request URI, if the route matches.
    pub fn rewrite_uri(&self, uri: &Uri) -> Option<String> {
        let captures = self.pattern.captures(uri.path())?;
        Some(captures.expand(&self.to, uri.query()))
    }
}

impl std::fmt::Debug for LocalRewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRewrite")
            .field("from", &self.pattern.as_str())
            .field("to", &self.to)
            .finish()
    }
}

impl RouteHandler for LocalRewrite {
    fn route(&self) -> &Route {
        &self.route
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Local
    }

    fn handle(&self, mut req: Request<Body>) -> Outcome {
        let Some(rewritten) = self.rewrite_uri(req.uri()) else {
            return Outcome::Continue(req);
        };

        match rewritten.parse::<Uri>() {
            Ok(uri) => {
                let from = req.uri().to_string();
                tracing::trace!(from = %from, to = %uri, "Local rewrite");
                self.observer.on_local_rewrite(&LocalRewriteEvent {
                    from,
                    to: rewritten,
                });
                *req.uri_mut() = uri;
            }
            Err(e) => {
                tracing::warn!(
                    from = %self.route.from,
                    to = %rewritten,
                    error = %e,
                    "Rewritten path is not a valid URI, leaving request unchanged"
                );
            }
        }
        Outcome::Continue(req)
    }
}
