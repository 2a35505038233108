//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use rewrite_proxy::config::ServerConfig;
use rewrite_proxy::http::DevServer;
use rewrite_proxy::lifecycle::Shutdown;
use rewrite_proxy::observability::events::{
    LocalRewriteEvent, ProxyRequestEvent, ProxyResponseEvent, RewriteObserver,
};
use rewrite_proxy::rewrite::Route;
use serde_json::json;
use tokio::net::TcpListener;

/// Start an upstream that echoes the request back as JSON.
///
/// Responds 201 with `x-upstream: echo`. Paths ending in `/redirect`
/// get a 302 instead.
pub async fn start_echo_upstream() -> SocketAddr {
    let app = Router::new().fallback(echo);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    if uri.path().ends_with("/redirect") {
        return (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")]).into_response();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    (
        StatusCode::CREATED,
        [("x-upstream", "echo")],
        Json(json!({
            "method": method.as_str(),
            "uri": uri.to_string(),
            "host": host,
            "body": String::from_utf8_lossy(&body),
        })),
    )
        .into_response()
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the dev server on an ephemeral port.
pub async fn start_server(
    rules: &[String],
    directory: &Path,
    observer: Arc<dyn RewriteObserver>,
) -> (SocketAddr, Shutdown) {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.static_files.directory = directory.display().to_string();
    config.rewrite.rules = rules.to_vec();

    let server = DevServer::new(config, observer).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that talks to the test server directly and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    pub configs: Mutex<Vec<Vec<Route>>>,
    pub requests: Mutex<Vec<ProxyRequestEvent>>,
    pub responses: Mutex<Vec<ProxyResponseEvent>>,
    pub locals: Mutex<Vec<LocalRewriteEvent>>,
}

impl RewriteObserver for RecordingObserver {
    fn on_config(&self, routes: &[Route]) {
        self.configs.lock().unwrap().push(routes.to_vec());
    }

    fn on_proxy_request(&self, event: &ProxyRequestEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn on_proxy_response(&self, event: &ProxyResponseEvent) {
        self.responses.lock().unwrap().push(event.clone());
    }

    fn on_local_rewrite(&self, event: &LocalRewriteEvent) {
        self.locals.lock().unwrap().push(event.clone());
    }
}
