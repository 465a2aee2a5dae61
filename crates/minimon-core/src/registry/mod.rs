//! Factory registries for notifiers and probes.
//!
//! Registries are plain objects built at startup and passed where needed,
//! so tests can assemble their own.

mod base;
mod notifier;
mod probe;

pub use base::FactoryRegistry;
pub use notifier::{NotifierFactory, NotifierRegistry};
pub use probe::{ProbeFactory, ProbeRegistry};
