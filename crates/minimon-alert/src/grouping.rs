//! Deadline- and size-bounded batching of messages into aggregates.

#[cfg(test)]
#[path = "grouping_tests.rs"]
mod tests;

use std::time::Duration;

use minimon_protocols::Message;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum number of messages in one aggregate.
pub const MAX_BATCH: usize = 10;

/// Batches messages until the window elapses or [`MAX_BATCH`] is reached.
#[derive(Debug)]
pub struct AlertGrouping {
    window: Duration,
    batch: Vec<Message>,
    deadline: Instant,
}

impl AlertGrouping {
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            batch: Vec::with_capacity(MAX_BATCH),
            deadline: now + window,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Add a message. Returns an aggregate when the batch is full.
    ///
    /// The first message of a batch starts a new window.
    pub fn push(&mut self, message: Message, now: Instant) -> Option<Message> {
        if self.batch.is_empty() {
            self.deadline = now + self.window;
        }
        self.batch.push(message);
        if self.batch.len() >= MAX_BATCH {
            return self.flush();
        }
        None
    }

    /// Deadline reached: flush a non-empty batch, otherwise re-arm.
    pub fn on_deadline(&mut self, now: Instant) -> Option<Message> {
        if self.batch.is_empty() {
            self.deadline = now + self.window;
            return None;
        }
        self.flush()
    }

    /// Drain the batch into one aggregate.
    pub fn flush(&mut self) -> Option<Message> {
        if self.batch.is_empty() {
            return None;
        }
        info!("Sending a grouped message of size {}", self.batch.len());
        let aggregate = Message::aggregate(&self.batch);
        self.batch.clear();
        Some(aggregate)
    }

    /// Run the grouping stage until cancelled or the input closes.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<Message>,
        output: mpsc::Sender<Message>,
        cancel: CancellationToken,
    ) {
        loop {
            let aggregate = tokio::select! {
                _ = cancel.cancelled() => {
                    if let Some(aggregate) = self.flush() {
                        if output.send(aggregate).await.is_err() {
                            warn!("Dropping pending aggregate at shutdown");
                        }
                    }
                    break;
                }
                received = input.recv() => match received {
                    Some(message) => self.push(message, Instant::now()),
                    None => {
                        if let Some(aggregate) = self.flush() {
                            let _ = output.send(aggregate).await;
                        }
                        break;
                    }
                },
                _ = sleep_until(self.deadline) => self.on_deadline(Instant::now()),
            };

            if let Some(aggregate) = aggregate {
                if output.send(aggregate).await.is_err() {
                    debug!("Grouping output closed");
                    break;
                }
            }
        }
        debug!("Grouping stage stopped");
    }
}
