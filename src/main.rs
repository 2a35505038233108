//! Development HTTP server with URL rewriting.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌────────────────────────────────────────────────┐
//!     ───────────────────────▶│  TraceLayer                                    │
//!                             │     │                                          │
//!                             │     ▼                                          │
//!                             │  RewriteService ── proxy route? ──────────────┼──▶ Remote
//!                             │     │  (local rewrites applied in order)       │    Host
//!                             │     ▼                                          │
//!                             │  ServeDir (static directory, timeout)          │
//!                             └────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::{load_config, validate_config, ConfigError, ServerConfig};
use rewrite_proxy::http::DevServer;
use rewrite_proxy::lifecycle::{signals, Shutdown};
use rewrite_proxy::observability::{logging, TracingObserver};

#[derive(Parser, Debug)]
#[command(name = "rewrite-proxy")]
#[command(about = "Static dev server with local and remote URL rewriting", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Hostname or IP to bind to.
    #[arg(long)]
    hostname: Option<String>,

    /// Root directory to serve.
    #[arg(short, long)]
    directory: Option<String>,

    /// A URL rewrite rule, "<from> -> <to>". Repeatable.
    #[arg(short, long = "rewrite", value_name = "EXPRESSION")]
    rewrite: Vec<String>,

    /// Log rewrite diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the file (or default) config.
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if self.hostname.is_some() || self.port.is_some() {
            let current: Option<SocketAddr> = config.listener.bind_address.parse().ok();
            let host = self
                .hostname
                .or_else(|| current.map(|a| a.ip().to_string()))
                .unwrap_or_else(|| "127.0.0.1".to_string());
            let port = self.port.or_else(|| current.map(|a| a.port())).unwrap_or(8000);
            config.listener.bind_address = format!("{}:{}", host, port);
        }
        if let Some(directory) = self.directory {
            config.static_files.directory = directory;
        }
        config.rewrite.rules.extend(self.rewrite);
        config.observability.verbose |= self.verbose;
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    let config = cli.apply(config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        directory = %config.static_files.directory,
        rules = config.rewrite.rules.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = DevServer::new(config, Arc::new(TracingObserver))?;

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::shutdown_on_ctrl_c(&signal_shutdown).await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    });

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
