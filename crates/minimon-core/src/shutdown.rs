//! Process-wide shutdown handle.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancellation token plus the reason of the first fatal error, if any.
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    fatal: Arc<Mutex<Option<String>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request a clean shutdown.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            info!("Shutdown requested");
        }
        self.token.cancel();
    }

    /// Record a fatal error and shut down. Only the first reason is kept.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        error!("FATAL: {}", reason);
        self.fatal.lock().get_or_insert(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Reason of the first fatal error.
    pub fn fatal_reason(&self) -> Option<String> {
        self.fatal.lock().clone()
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.lock().is_some()
    }

    /// Wait until shutdown is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("cancelled", &self.is_cancelled())
            .field("fatal", &self.fatal_reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cancel() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_cancelled());
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
        assert!(!shutdown.is_fatal());
    }

    #[test]
    fn test_fail_keeps_first_reason() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        clone.fail("sync failed");
        shutdown.fail("second");
        assert!(shutdown.is_cancelled());
        assert_eq!(shutdown.fatal_reason().as_deref(), Some("sync failed"));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.cancelled().await })
        };
        shutdown.cancel();
        waiter.await.unwrap();
    }
}
