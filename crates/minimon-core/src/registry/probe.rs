//! Probe factory registry.

use std::sync::Arc;
use std::time::Duration;

use minimon_protocols::{Probe, ProbeError};

use super::base::FactoryRegistry;
use crate::error::RegistryError;

/// Builds a probe from its `params` table and the provider's scrape interval.
pub type ProbeFactory =
    dyn Fn(&serde_json::Value, Duration) -> Result<Arc<dyn Probe>, ProbeError> + Send + Sync;

/// Registry of probe types.
pub type ProbeRegistry = FactoryRegistry<ProbeFactory>;

impl FactoryRegistry<ProbeFactory> {
    /// Register a probe factory closure.
    pub fn register_probe<F>(&self, type_name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&serde_json::Value, Duration) -> Result<Arc<dyn Probe>, ProbeError> + Send + Sync + 'static,
    {
        self.register(type_name, Arc::new(factory))
    }

    /// Instantiate a probe of `type_name`.
    pub fn create(
        &self,
        type_name: &str,
        params: &serde_json::Value,
        scrape_interval: Duration,
    ) -> Result<Arc<dyn Probe>, ProbeError> {
        let factory = self
            .get(type_name)
            .ok_or_else(|| ProbeError::UnknownType(type_name.to_string()))?;
        factory(params, scrape_interval)
    }
}
