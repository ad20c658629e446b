use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Wait for SIGINT, or SIGTERM on unix.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<ShutdownSignal> {
    let mut sigterm = unix_signal(SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result.map(|()| ShutdownSignal::Interrupt),
        _ = sigterm.recv() => Ok(ShutdownSignal::Terminate),
    }
}

/// Wait for SIGINT.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<ShutdownSignal> {
    signal::ctrl_c().await.map(|()| ShutdownSignal::Interrupt)
}

/// Cancel `token` when a shutdown signal arrives. The listener also stops
/// quietly if the token is cancelled for another reason.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = wait_for_signal() => match result {
                Ok(ShutdownSignal::Interrupt) => {
                    info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                    token.cancel();
                }
                Ok(ShutdownSignal::Terminate) => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    token.cancel();
                }
                Err(err) => {
                    error!("Failed to listen for shutdown signals: {}", err);
                }
            },
            _ = token.cancelled() => {}
        }
    })
}
