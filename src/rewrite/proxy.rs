//! Remote rewriting (reverse proxy).
//!
//! # Responsibilities
//! - Match all methods on the route's `from` pattern
//! - Resolve the remote URL and override the `Host` header
//! - Stream the request body upstream and the response body back
//! - Report request and response heads to the observer
//!
//! # Design Decisions
//! - Full duplex passthrough: neither body is buffered
//! - No retries; an unreachable upstream becomes 502 Bad Gateway
//! - Upstream redirects are relayed to the client, not followed
//! - Request ids come from a counter owned by the dispatcher

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::observability::events::{
    header_fields, ProxyRequestEvent, ProxyResponseEvent, RewriteDescriptor, RewriteObserver,
};
use crate::rewrite::handler::{HandlerKind, Outcome, RouteHandler};
use crate::rewrite::pattern::PathPattern;
use crate::rewrite::rule::Route;
use crate::rewrite::RewriteError;

/// Build the upstream HTTP client shared by all proxy handlers.
pub fn build_client() -> Result<reqwest::Client, RewriteError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .map_err(RewriteError::Client)
}

/// `Host` header value for a target: host plus any non-default port.
pub fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

pub struct ProxyHandler {
    route: Route,
    pattern: PathPattern,
    to: String,
    client: reqwest::Client,
    ids: Arc<AtomicU64>,
    observer: Arc<dyn RewriteObserver>,
}

impl ProxyHandler {
    pub fn new(
        route: Route,
        to: String,
        client: reqwest::Client,
        ids: Arc<AtomicU64>,
        observer: Arc<dyn RewriteObserver>,
    ) -> Self {
        Self {
            pattern: PathPattern::new(&route.from),
            route,
            to,
            client,
            ids,
            observer,
        }
    }

    /// Resolve the remote URL for a request path and query, if the route matches.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<String> {
        let captures = self.pattern.captures(path)?;
        Some(captures.expand(&self.to, query))
    }
}

impl std::fmt::Debug for ProxyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandler")
            .field("from", &self.pattern.as_str())
            .field("to", &self.to)
            .finish()
    }
}

impl RouteHandler for ProxyHandler {
    fn route(&self) -> &Route {
        &self.route
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Proxy
    }

    fn handle(&self, req: Request<Body>) -> Outcome {
        let Some(remote) = self.resolve(req.uri().path(), req.uri().query()) else {
            return Outcome::Continue(req);
        };

        let rewrite = RewriteDescriptor {
            id: self.ids.fetch_add(1, Ordering::Relaxed),
            from: req.uri().to_string(),
            to: remote,
        };

        Outcome::Respond(Box::pin(forward(
            self.client.clone(),
            self.observer.clone(),
            rewrite,
            req,
        )))
    }
}

async fn forward(
    client: reqwest::Client,
    observer: Arc<dyn RewriteObserver>,
    rewrite: RewriteDescriptor,
    req: Request<Body>,
) -> Response {
    let target = match Url::parse(&rewrite.to) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(id = rewrite.id, to = %rewrite.to, error = %e, "Invalid remote URL");
            return (StatusCode::BAD_GATEWAY, "Invalid remote URL").into_response();
        }
    };

    let (parts, body) = req.into_parts();
    let mut headers = parts.headers;
    if let Some(host) = host_header(&target).and_then(|h| HeaderValue::from_str(&h).ok()) {
        headers.insert(header::HOST, host);
    }

    observer.on_proxy_request(&ProxyRequestEvent {
        rewrite: rewrite.clone(),
        method: parts.method.to_string(),
        headers: header_fields(&headers),
    });

    tracing::debug!(
        id = rewrite.id,
        method = %parts.method,
        from = %rewrite.from,
        to = %rewrite.to,
        "Forwarding request upstream"
    );

    let mut outbound = client.request(parts.method, target).headers(headers);
    if !body.is_end_stream() {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    match outbound.send().await {
        Ok(upstream) => {
            let status = upstream.status();
            let headers = upstream.headers().clone();

            observer.on_proxy_response(&ProxyResponseEvent {
                rewrite: rewrite.clone(),
                status: status.as_u16(),
                headers: header_fields(&headers),
            });

            relay(status, headers, Body::from_stream(upstream.bytes_stream()))
        }
        Err(e) => {
            tracing::error!(id = rewrite.id, to = %rewrite.to, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Assemble the client response from the upstream head and a streaming body.
fn relay(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
