//! OS signal handling.

use dockerutil_core::DaemonError;
use tracing::info;

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
pub(crate) async fn shutdown_signal() -> Result<(), DaemonError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
    let mut sigint =
        signal(SignalKind::interrupt()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
    Ok(())
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn shutdown_signal() -> Result<(), DaemonError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
    info!("Received Ctrl-C");
    Ok(())
}
