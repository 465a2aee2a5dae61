//! Notification dispatch loop.

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

use std::sync::Arc;

use minimon_protocols::{Message, Notifier, NotifierError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fans pipeline output out to every configured notifier.
pub struct NotificationDispatcher {
    machine_name: String,
    notifiers: Vec<(String, Arc<dyn Notifier>)>,
}

impl NotificationDispatcher {
    /// Create a dispatcher prefixing titles with `machine_name`.
    pub fn new(machine_name: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
            notifiers: Vec::new(),
        }
    }

    /// Add a notifier under its configured instance name.
    pub fn add_notifier(&mut self, name: impl Into<String>, notifier: Arc<dyn Notifier>) {
        self.notifiers.push((name.into(), notifier));
    }

    pub fn notifier_names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Send one message to every notifier. Failures are logged and returned.
    pub async fn dispatch(&self, message: &Message) -> Vec<NotifierError> {
        let message = message.clone().with_title_prefix(&self.machine_name);
        let mut errors = Vec::new();

        for (name, notifier) in &self.notifiers {
            match notifier.send(&message).await {
                Ok(()) => debug!("Sent '{}' via {}", message.title, name),
                Err(e) => {
                    error!("Failed to send notification via {}: {}", name, e);
                    errors.push(e);
                }
            }
        }

        errors
    }

    /// Deliver messages until `input` closes.
    ///
    /// Once `cancel` fires the loop keeps draining, so the aggregate the
    /// grouping stage flushes at shutdown still goes out.
    pub async fn run(self, mut input: mpsc::Receiver<Message>, cancel: CancellationToken) {
        info!(
            "Dispatching notifications to {} notifier(s): {:?}",
            self.notifiers.len(),
            self.notifier_names()
        );
        let mut draining = false;
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled(), if !draining => {
                    debug!("Dispatch loop draining remaining messages");
                    draining = true;
                    continue;
                }
                message = input.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            self.dispatch(&message).await;
        }
        debug!("Dispatch loop stopped");
    }
}
