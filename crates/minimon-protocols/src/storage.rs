//! Bookkeeping key-value store protocol.

use crate::error::StorageError;

/// Small persistent string-to-string store shared by probes.
///
/// Implementations must be safe under concurrent `get`/`set`, since probe
/// tasks run in parallel inside the scheduler's worker pool.
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// Returns `true` if the stored value changed. Writing the current value
    /// again returns `false` and leaves the store clean.
    fn set(&self, key: &str, value: &str) -> bool;

    /// Remove `key` if present.
    fn remove(&self, key: &str);

    /// Persist pending changes; `force` persists even when nothing changed.
    fn sync(&self, force: bool) -> Result<(), StorageError>;
}
