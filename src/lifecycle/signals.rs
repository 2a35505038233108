//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C, then trigger shutdown.
pub async fn shutdown_on_ctrl_c(shutdown: &Shutdown) -> Result<(), std::io::Error> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received, shutting down");
    shutdown.trigger();
    Ok(())
}
