//! Startup wiring errors.

use minimon_protocols::{NotifierError, ProbeError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Factory already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Cannot set up notifier {name}: {source}")]
    Notifier {
        name: String,
        #[source]
        source: NotifierError,
    },

    #[error("Cannot set up provider {name}: {source}")]
    Probe {
        name: String,
        #[source]
        source: ProbeError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_error() {
        let err = RegistryError::AlreadyRegistered("webhook".to_string());
        assert!(err.to_string().contains("already registered"));
        assert!(err.to_string().contains("webhook"));
    }

    #[test]
    fn test_probe_error_names_provider() {
        let err = RegistryError::Probe {
            name: "disk_root".to_string(),
            source: ProbeError::InvalidParams("mountpoints is required".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("disk_root"));
        assert!(display.contains("mountpoints is required"));
    }

    #[test]
    fn test_storage_error_from() {
        let err = RegistryError::from(StorageError::InvalidPrefix("a/b".to_string()));
        assert!(err.to_string().contains("a/b"));
    }
}
