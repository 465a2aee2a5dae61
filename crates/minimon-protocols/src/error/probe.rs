//! Probe setup errors.
//!
//! Runtime probe failures are never errors: they are published as
//! unhealthy [`ScrapeEvent`](crate::ScrapeEvent)s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unknown probe type: {0}")]
    UnknownType(String),

    #[error("Invalid probe parameters: {0}")]
    InvalidParams(String),

    #[error("Probe setup failed: {0}")]
    SetupFailed(String),

    #[error("Probe type {0} cannot be instantiated more than once")]
    SingleInstance(String),
}
