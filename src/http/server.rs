//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router serving the static directory
//! - Wrap it with the rewrite middleware
//! - Wire up middleware (tracing, timeouts)
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::lifecycle::Shutdown;
use crate::observability::events::RewriteObserver;
use crate::rewrite::{Dispatcher, RewriteError, RewriteLayer};

/// Development HTTP server: static files behind the rewrite middleware.
pub struct DevServer {
    router: Router,
    config: ServerConfig,
}

impl DevServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig, observer: Arc<dyn RewriteObserver>) -> Result<Self, RewriteError> {
        let dispatcher = Dispatcher::from_rules(&config.rewrite.rules, observer)?;
        let router = with_rewrites(Self::site_router(&config), dispatcher);
        Ok(Self { router, config })
    }

    /// Local content: the static directory with a request timeout.
    #[allow(deprecated)]
    fn site_router(config: &ServerConfig) -> Router {
        Router::new()
            .fallback_service(ServeDir::new(&config.static_files.directory))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            directory = %self.config.static_files.directory,
            rules = self.config.rewrite.rules.len(),
            "Dev server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown.signal().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The assembled router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Put the rewrite middleware in front of a site router.
///
/// The site router sees rewritten paths; proxied requests never reach it.
pub fn with_rewrites(site: Router, dispatcher: Dispatcher) -> Router {
    let rewritten = RewriteLayer::new(dispatcher).layer(site);
    Router::new()
        .fallback_service(rewritten)
        .layer(TraceLayer::new_for_http())
}
