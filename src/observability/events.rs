//! Rewrite diagnostic events.
//!
//! # Responsibilities
//! - Define the observer interface the rewrite middleware reports to
//! - Define the event payloads (rewrite descriptor, request/response info)
//! - Provide a `tracing`-backed observer for the dev server
//!
//! # Design Decisions
//! - Observer is injected (`Arc<dyn RewriteObserver>`), no global event bus
//! - Every callback has a no-op default so observers pick what they need
//! - Payloads are serde-serializable; the tracing observer logs them as JSON

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use serde::Serialize;

use crate::rewrite::Route;

/// Emitted once per middleware construction with the parsed routes.
pub const CONFIG_EVENT: &str = "middleware.rewrite.config";
/// Emitted before a request is forwarded upstream.
pub const REMOTE_REQUEST_EVENT: &str = "middleware.rewrite.remote.request";
/// Emitted when the upstream response head arrives.
pub const REMOTE_RESPONSE_EVENT: &str = "middleware.rewrite.remote.response";
/// Emitted when a request path is rewritten in-process.
pub const LOCAL_EVENT: &str = "middleware.rewrite.local";

/// Per-request record correlating the original and resolved URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteDescriptor {
    pub id: u64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequestEvent {
    pub rewrite: RewriteDescriptor,
    pub method: String,
    /// Outbound headers, `Host` already overridden.
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyResponseEvent {
    pub rewrite: RewriteDescriptor,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalRewriteEvent {
    pub from: String,
    pub to: String,
}

#[derive(Serialize)]
struct ConfigPayload<'a> {
    rewrite: &'a [Route],
}

/// Receives diagnostic events from the rewrite middleware.
pub trait RewriteObserver: Send + Sync {
    fn on_config(&self, _routes: &[Route]) {}

    fn on_proxy_request(&self, _event: &ProxyRequestEvent) {}

    fn on_proxy_response(&self, _event: &ProxyResponseEvent) {}

    fn on_local_rewrite(&self, _event: &LocalRewriteEvent) {}
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RewriteObserver for NoopObserver {}

/// Observer that logs each event at debug level with a JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    fn emit<T: Serialize>(&self, event: &'static str, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(json) => tracing::debug!(event, payload = %json, "Rewrite diagnostic"),
            Err(e) => tracing::warn!(event, error = %e, "Failed to serialize rewrite diagnostic"),
        }
    }
}

impl RewriteObserver for TracingObserver {
    fn on_config(&self, routes: &[Route]) {
        self.emit(CONFIG_EVENT, &ConfigPayload { rewrite: routes });
    }

    fn on_proxy_request(&self, event: &ProxyRequestEvent) {
        self.emit(REMOTE_REQUEST_EVENT, event);
    }

    fn on_proxy_response(&self, event: &ProxyResponseEvent) {
        self.emit(REMOTE_RESPONSE_EVENT, event);
    }

    fn on_local_rewrite(&self, event: &LocalRewriteEvent) {
        self.emit(LOCAL_EVENT, event);
    }
}

/// Flatten a header map for diagnostics. Repeated headers are joined with ", ".
pub fn header_fields(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        fields
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_fields_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.com"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let fields = header_fields(&headers);
        assert_eq!(fields["host"], "example.com");
        assert_eq!(fields["accept"], "text/html, application/json");
    }

    #[test]
    fn test_request_event_payload_shape() {
        let event = ProxyRequestEvent {
            rewrite: RewriteDescriptor {
                id: 1,
                from: "/api/users".into(),
                to: "http://upstream.test/api/users".into(),
            },
            method: "GET".into(),
            headers: BTreeMap::from([("host".to_string(), "upstream.test".to_string())]),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["rewrite"]["id"], 1);
        assert_eq!(json["rewrite"]["to"], "http://upstream.test/api/users");
        assert_eq!(json["headers"]["host"], "upstream.test");
    }
}
