//! Error types for the minimon protocol layer.

mod notifier;
mod probe;
mod storage;

pub use notifier::*;
pub use probe::*;
pub use storage::*;
