//! JSON-file backed store.

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use minimon_protocols::{KvStore, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::memory::StoreState;

/// On-disk layout: `{"database": {"key": "value", ...}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    database: BTreeMap<String, String>,
}

/// Store persisted to a single JSON file.
///
/// Changes stay in memory until [`KvStore::sync`]; the file is replaced
/// atomically (write to a sibling temp file, then rename).
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. A file that exists but does not
    /// hold a valid document is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => {
                let document: Document =
                    serde_json::from_str(&content).map_err(|e| StorageError::Malformed {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                debug!("Loaded {} entries from {:?}", document.database.len(), path);
                document.database
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Storage file {:?} does not exist, starting empty", path);
                BTreeMap::new()
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            state: Mutex::new(StoreState {
                entries,
                dirty: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let sync_failed = |message: String| StorageError::SyncFailed {
            path: self.path.clone(),
            message,
        };

        let document = Document {
            database: entries.clone(),
        };
        let content =
            serde_json::to_string_pretty(&document).map_err(|e| sync_failed(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| sync_failed(e.to_string()))?;
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, content).map_err(|e| sync_failed(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| sync_failed(e.to_string()))?;
        Ok(())
    }
}

impl KvStore for JsonStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.state.lock().set(key, value)
    }

    fn remove(&self, key: &str) {
        self.state.lock().remove(key);
    }

    fn sync(&self, force: bool) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if !state.dirty && !force {
            return Ok(());
        }
        self.write_document(&state.entries)?;
        state.dirty = false;
        info!("Synced {} entries to {:?}", state.entries.len(), self.path);
        Ok(())
    }
}
