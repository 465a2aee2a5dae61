//! # minimon Storage
//!
//! Small string-to-string stores used by probes for bookkeeping.
//!
//! - [`MemoryStore`]: in-process only, `sync` is a no-op
//! - [`JsonStore`]: persisted to a JSON file as `{"database": {...}}`
//! - [`NamespacedStore`]: prefixes every key with `"<prefix>/"`

mod json;
mod memory;
mod namespaced;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use namespaced::NamespacedStore;
