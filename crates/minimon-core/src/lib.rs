//! # minimon Core
//!
//! Startup wiring shared by the binary and the integration tests.
//!
//! - [`NotifierRegistry`] / [`ProbeRegistry`]: type name to factory maps,
//!   populated explicitly at startup
//! - [`Shutdown`]: process-wide cancellation plus the fatal-error slot
//! - [`ScrapeDriver`]: builds probes and runs them through the scheduler

pub mod error;
pub mod registry;
pub mod scraping;
pub mod shutdown;

pub use error::RegistryError;
pub use registry::{FactoryRegistry, NotifierFactory, NotifierRegistry, ProbeFactory, ProbeRegistry};
pub use scraping::{ProviderInstance, STORAGE_SYNC_INTERVAL, ScrapeDriver};
pub use shutdown::Shutdown;
