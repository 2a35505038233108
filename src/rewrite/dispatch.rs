//! Route dispatch.
//!
//! # Responsibilities
//! - Turn parsed routes into local or proxy handlers (once, at construction)
//! - Own the proxy request id counter
//! - Run handlers in configuration order for each request
//!
//! # Design Decisions
//! - Routes without a destination get no handler
//! - Immutable after construction; the id counter is the only shared mutable state
//! - Local rewrites chain; the first matching proxy route answers

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use crate::observability::events::RewriteObserver;
use crate::rewrite::handler::{HandlerKind, Outcome, RouteHandler};
use crate::rewrite::local::LocalRewrite;
use crate::rewrite::proxy::{build_client, ProxyHandler};
use crate::rewrite::rule::{parse_rules, Route, Target};
use crate::rewrite::RewriteError;

#[derive(Debug)]
pub struct Dispatcher {
    routes: Vec<Route>,
    handlers: Vec<Box<dyn RouteHandler>>,
}

impl Dispatcher {
    /// Parse rule strings and build the handlers.
    pub fn from_rules<I, S>(rules: I, observer: Arc<dyn RewriteObserver>) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(parse_rules(rules), observer)
    }

    /// Build handlers for already parsed routes.
    pub fn new(routes: Vec<Route>, observer: Arc<dyn RewriteObserver>) -> Result<Self, RewriteError> {
        if !routes.is_empty() {
            observer.on_config(&routes);
        }

        let ids = Arc::new(AtomicU64::new(1));
        let mut client: Option<reqwest::Client> = None;
        let mut handlers: Vec<Box<dyn RouteHandler>> = Vec::with_capacity(routes.len());

        for route in &routes {
            let Some(target) = route.target() else {
                tracing::warn!(from = %route.from, "Ignoring rewrite rule without a destination");
                continue;
            };
            let to = route.to.clone().unwrap_or_default();

            match target {
                Target::Remote(url) => {
                    // One connection pool for every proxy route.
                    let shared = match client.take() {
                        Some(existing) => existing,
                        None => build_client()?,
                    };
                    client = Some(shared.clone());
                    tracing::info!(from = %route.from, to = %url, "Proxy route registered");
                    handlers.push(Box::new(ProxyHandler::new(
                        route.clone(),
                        to,
                        shared,
                        ids.clone(),
                        observer.clone(),
                    )));
                }
                Target::Local(path) => {
                    tracing::info!(from = %route.from, to = %path, "Local rewrite registered");
                    handlers.push(Box::new(LocalRewrite::new(route.clone(), to, observer.clone())));
                }
            }
        }

        Ok(Self { routes, handlers })
    }

    /// All parsed routes, including ignored ones.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn handlers(&self) -> &[Box<dyn RouteHandler>] {
        &self.handlers
    }

    /// Handler kinds in registration order.
    pub fn kinds(&self) -> Vec<HandlerKind> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run a request through every handler until one responds.
    pub fn dispatch(&self, mut req: Request<Body>) -> Outcome {
        for handler in &self.handlers {
            match handler.handle(req) {
                Outcome::Continue(next) => req = next,
                respond => return respond,
            }
        }
        Outcome::Continue(req)
    }
}
