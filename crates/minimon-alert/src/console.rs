//! Console notifier: writes messages to the log.

use async_trait::async_trait;
use minimon_protocols::{Message, MessageKind, Notifier, NotifierError};
use tracing::{info, warn};

/// Notifier that logs every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(&self, message: &Message) -> Result<(), NotifierError> {
        match message.kind {
            MessageKind::Failure => warn!("[NOTIFY] {}\n{}", message.title, message.body),
            _ => info!("[NOTIFY] {}\n{}", message.title, message.body),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_send_never_fails() {
        let notifier = ConsoleNotifier::new();
        assert_eq!(notifier.name(), "console");
        notifier.send(&Message::failure("disk failed")).await.unwrap();
        notifier
            .send(&Message::aggregate(&[Message::recovery("disk recovered")]))
            .await
            .unwrap();
    }
}
