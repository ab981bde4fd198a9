//! Shutdown signal handling

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first Ctrl+C or SIGTERM.
///
/// Handler installation failures are logged and also cancel the token,
/// so the agent never runs without a way to stop it.
pub fn spawn_shutdown_listener(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = wait_for_shutdown() => {
                if let Err(e) = result {
                    tracing::error!("Signal handling failed: {:#}", e);
                }
            }
        }
        cancel.cancel();
    })
}

/// Wait for Ctrl+C or SIGTERM
pub async fn wait_for_shutdown() -> Result<()> {
    tokio::select! {
        result = wait_ctrl_c() => result?,
        result = wait_sigterm() => result?,
    }

    tracing::info!("Shutdown signal received");
    Ok(())
}

async fn wait_ctrl_c() -> Result<()> {
    signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    tracing::info!("Received Ctrl+C");
    Ok(())
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;
    sigterm.recv().await;
    tracing::info!("Received SIGTERM");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<()> {
    std::future::pending::<Result<()>>().await
}
