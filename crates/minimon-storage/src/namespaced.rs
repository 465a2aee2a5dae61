//! Prefixed view over another store.

use std::sync::Arc;

use minimon_protocols::{KvStore, StorageError, is_valid_name};

/// Store view where every key is written as `"<prefix>/<key>"`.
pub struct NamespacedStore {
    prefix: String,
    inner: Arc<dyn KvStore>,
}

impl NamespacedStore {
    /// Wrap `inner`. The prefix must be a valid provider name.
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let prefix = prefix.into();
        if !is_valid_name(&prefix) {
            return Err(StorageError::InvalidPrefix(prefix));
        }
        Ok(Self { prefix, inner })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}/{}", self.prefix, key)
    }
}

impl KvStore for NamespacedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&self.full_key(key))
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.inner.set(&self.full_key(key), value)
    }

    fn remove(&self, key: &str) {
        self.inner.remove(&self.full_key(key));
    }

    fn sync(&self, force: bool) -> Result<(), StorageError> {
        self.inner.sync(force)
    }
}
