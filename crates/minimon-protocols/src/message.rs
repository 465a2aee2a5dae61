//! Notification messages produced by the alert pipeline.

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of a notification message.
///
/// The declaration order is also the order in which kinds are listed in an
/// aggregate title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// One-off event without health semantics.
    Notification,
    /// A metric became (or is still) unhealthy.
    Failure,
    /// A metric became healthy again.
    Recovery,
    /// Digest of several messages.
    Aggregate,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Notification => write!(f, "Notification"),
            MessageKind::Failure => write!(f, "Failure"),
            MessageKind::Recovery => write!(f, "Recovery"),
            MessageKind::Aggregate => write!(f, "Aggregate"),
        }
    }
}

/// An immutable notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message kind.
    pub kind: MessageKind,
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
}

impl Message {
    /// Create a message titled after its kind.
    pub fn new(kind: MessageKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.to_string(),
            body: body.into(),
        }
    }

    /// Create a notification message.
    pub fn notification(body: impl Into<String>) -> Self {
        Self::new(MessageKind::Notification, body)
    }

    /// Create a failure message.
    pub fn failure(body: impl Into<String>) -> Self {
        Self::new(MessageKind::Failure, body)
    }

    /// Create a recovery message.
    pub fn recovery(body: impl Into<String>) -> Self {
        Self::new(MessageKind::Recovery, body)
    }

    /// Summarize `messages` into a single aggregate.
    ///
    /// The title lists the per-kind counts, the body holds one line per
    /// message in the given order.
    pub fn aggregate(messages: &[Message]) -> Self {
        let mut counts: BTreeMap<MessageKind, usize> = BTreeMap::new();
        let mut body = String::new();

        for message in messages {
            *counts.entry(message.kind).or_default() += 1;
            body.push_str(" - ");
            body.push_str(&message.body);
            body.push('\n');
        }

        let title = counts
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            kind: MessageKind::Aggregate,
            title,
            body,
        }
    }

    /// Prefix the title, e.g. with the machine name.
    pub fn with_title_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.title = format!("{} {}", prefix, self.title);
        }
        self
    }

    /// Format for text output.
    pub fn format_text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}
