//! In-memory store.

use std::collections::BTreeMap;

use minimon_protocols::{KvStore, StorageError};
use parking_lot::Mutex;

/// Map plus a dirty flag, shared by the in-process and file-backed stores.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) entries: BTreeMap<String, String>,
    pub(crate) dirty: bool,
}

impl StoreState {
    pub(crate) fn set(&mut self, key: &str, value: &str) -> bool {
        if self.entries.get(key).is_some_and(|current| current == value) {
            return false;
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.dirty = true;
        true
    }

    pub(crate) fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there are changes not yet synced.
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.state.lock().set(key, value)
    }

    fn remove(&self, key: &str) {
        self.state.lock().remove(key);
    }

    fn sync(&self, _force: bool) -> Result<(), StorageError> {
        self.state.lock().dirty = false;
        Ok(())
    }
}
