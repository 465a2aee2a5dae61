//! OS signal handling.

use std::io;

use tracing::info;

/// Shutdown signal listener (SIGINT and SIGTERM).
#[cfg(unix)]
pub(crate) struct ShutdownSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Install the handlers. Must be called from within the runtime.
    pub(crate) fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigterm = signal(SignalKind::terminate())?;
        let sigint = signal(SignalKind::interrupt())?;
        info!("OS signal handlers installed (SIGTERM, SIGINT)");
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the next shutdown signal and return its name.
    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Shutdown signal listener (Ctrl+C only).
#[cfg(not(unix))]
pub(crate) struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub(crate) fn install() -> io::Result<Self> {
        info!("OS signal handlers installed (Ctrl+C only)");
        Ok(Self)
    }

    pub(crate) async fn recv(&mut self) -> &'static str {
        // An error means the handler cannot be installed; wait forever instead.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}
