//! Notifier protocol definitions.
//!
//! Notifiers deliver pipeline output to the outside world (console,
//! webhooks, ...). Delivery is best-effort: a failed send is reported to
//! the caller, which logs it and moves on.

use async_trait::async_trait;

use crate::error::NotifierError;
use crate::message::Message;

/// Delivery channel for notification messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifier type name.
    fn name(&self) -> &str;

    /// Send a message.
    async fn send(&self, message: &Message) -> Result<(), NotifierError>;
}
