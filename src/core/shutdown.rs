//! Process shutdown signals (Ctrl-C and, on unix, SIGTERM).

use tokio::signal;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

/// Signal handlers registered up front so a signal delivered before `recv`
/// is still observed.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: signal::unix::signal(signal::unix::SignalKind::terminate())?,
        })
    }

    /// Wait for the first shutdown signal.
    pub async fn recv(mut self) -> ShutdownReason {
        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Ctrl-C handler failed, shutting down");
                }
                ShutdownReason::Interrupt
            }
            _ = self.terminate() => ShutdownReason::Terminate,
        }
    }

    #[cfg(unix)]
    async fn terminate(&mut self) {
        if self.terminate.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    async fn terminate(&mut self) {
        std::future::pending::<()>().await
    }
}
