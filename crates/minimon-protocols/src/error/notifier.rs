//! Notifier errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Unknown notifier type: {0}")]
    UnknownType(String),

    #[error("Invalid notifier parameters: {0}")]
    InvalidParams(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}
