//! Signal handling for graceful exit of the interactive shell

use tokio::signal;
use tracing::{debug, warn};

/// Resolves when the user interrupts (Ctrl-C) or the process is terminated
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    pub async fn wait(&self) {
        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => debug!("received interrupt"),
                    Err(e) => {
                        warn!(?e, "failed to listen for interrupt");
                        std::future::pending::<()>().await;
                    }
                }
            }
            _ = terminate() => {
                debug!("received SIGTERM");
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(?e, "failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
