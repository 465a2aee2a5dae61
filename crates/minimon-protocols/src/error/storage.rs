//! Bookkeeping store errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage file {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Failed to sync storage to {path}: {message}")]
    SyncFailed { path: PathBuf, message: String },

    #[error("Illegal storage prefix: {0}")]
    InvalidPrefix(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let err = StorageError::Malformed {
            path: PathBuf::from("/var/lib/minimon/cache.json"),
            message: "expected value".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("cache.json"));
        assert!(display.contains("malformed"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::from(io_err);
        assert!(err.to_string().contains("denied"));
    }
}
