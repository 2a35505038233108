//! Local rewrites, static fallthrough and in-process layering.

use std::fs;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use rewrite_proxy::http::with_rewrites;
use rewrite_proxy::observability::NoopObserver;
use rewrite_proxy::rewrite::{Dispatcher, HandlerKind};
use tower::ServiceExt;

mod common;

use common::RecordingObserver;

fn site_with_files() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("to")).unwrap();
    fs::write(dir.path().join("to/page.html"), "local page").unwrap();
    fs::write(dir.path().join("index.html"), "home").unwrap();
    dir
}

#[tokio::test]
async fn test_local_rewrite_serves_other_file() {
    let site = site_with_files();
    let observer = Arc::new(RecordingObserver::default());
    let rules = vec!["/from -> /to".to_string()];
    let (addr, shutdown) = common::start_server(&rules, site.path(), observer.clone()).await;

    let res = common::client()
        .get(format!("http://{}/from/page.html", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "local page");

    let locals = observer.locals.lock().unwrap();
    assert_eq!(locals.len(), 1);
    assert_eq!(locals[0].from, "/from/page.html");
    assert_eq!(locals[0].to, "/to/page.html");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_and_malformed_rules_fall_through() {
    let site = site_with_files();
    let observer = Arc::new(RecordingObserver::default());
    let rules = vec!["/broken".to_string(), "/from -> /to".to_string()];
    let (addr, shutdown) = common::start_server(&rules, site.path(), observer.clone()).await;

    let res = common::client()
        .get(format!("http://{}/index.html", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "home");
    assert!(observer.locals.lock().unwrap().is_empty());

    // Both parsed routes are reported, the broken one without a destination.
    let configs = observer.configs.lock().unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].len(), 2);
    assert!(configs[0][0].to.is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_rewrite_then_proxy_in_order() {
    let upstream = common::start_echo_upstream().await;
    let site = tempfile::tempdir().unwrap();
    let rules = vec![
        "/legacy -> /api".to_string(),
        format!("/api -> http://{}/service", upstream),
    ];
    let (addr, shutdown) = common::start_server(&rules, site.path(), Arc::new(RecordingObserver::default())).await;

    let res = common::client()
        .get(format!("http://{}/legacy/status", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let echoed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(echoed["uri"], "/service/status");

    shutdown.trigger();
}

#[tokio::test]
async fn test_layer_wraps_any_router() {
    let site = Router::new()
        .route("/to", get(|| async { "reached /to" }))
        .route("/plain", get(|| async { "plain" }));

    let dispatcher = Dispatcher::from_rules(["/from -> /to"], Arc::new(NoopObserver)).unwrap();
    assert_eq!(dispatcher.kinds(), vec![HandlerKind::Local]);
    let app = with_rewrites(site, dispatcher);

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/from").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"reached /to");

    let res = app
        .oneshot(Request::builder().uri("/plain").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"plain");
}
