//! Tower integration for the rewrite dispatcher.
//!
//! Wrap the service that serves local content; requests reach it only after
//! local rewrites are applied and no proxy route answered. Wrap the whole
//! `Router` (not `Router::layer`) so rewritten paths are routed normally.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::rewrite::dispatch::Dispatcher;
use crate::rewrite::handler::Outcome;

#[derive(Debug, Clone)]
pub struct RewriteLayer {
    dispatcher: Arc<Dispatcher>,
}

impl RewriteLayer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl<S> Layer<S> for RewriteLayer {
    type Service = RewriteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteService {
            dispatcher: self.dispatcher.clone(),
            inner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewriteService<S> {
    dispatcher: Arc<Dispatcher>,
    inner: S,
}

impl<S> Service<Request<Body>> for RewriteService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The instance that was polled ready serves this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        match self.dispatcher.dispatch(req) {
            Outcome::Respond(response) => Box::pin(async move { Ok(response.await) }),
            Outcome::Continue(req) => Box::pin(inner.call(req)),
        }
    }
}
