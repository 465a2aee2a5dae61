//! Notifier factory registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use minimon_config::NotifierConfig;
use minimon_protocols::{Notifier, NotifierError};
use tracing::info;

use super::base::FactoryRegistry;
use crate::error::RegistryError;

/// Builds a notifier from its `params` table.
pub type NotifierFactory =
    dyn Fn(&serde_json::Value) -> Result<Arc<dyn Notifier>, NotifierError> + Send + Sync;

/// Registry of notifier types.
pub type NotifierRegistry = FactoryRegistry<NotifierFactory>;

impl FactoryRegistry<NotifierFactory> {
    /// Register a notifier factory closure.
    pub fn register_notifier<F>(&self, type_name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn Notifier>, NotifierError> + Send + Sync + 'static,
    {
        self.register(type_name, Arc::new(factory))
    }

    /// Instantiate a notifier of `type_name`.
    pub fn create(
        &self,
        type_name: &str,
        params: &serde_json::Value,
    ) -> Result<Arc<dyn Notifier>, NotifierError> {
        let factory = self
            .get(type_name)
            .ok_or_else(|| NotifierError::UnknownType(type_name.to_string()))?;
        factory(params)
    }

    /// Instantiate every configured notifier, in name order.
    pub fn create_all(
        &self,
        configs: &BTreeMap<String, NotifierConfig>,
    ) -> Result<Vec<(String, Arc<dyn Notifier>)>, RegistryError> {
        configs
            .iter()
            .map(|(name, config)| {
                let notifier = self
                    .create(&config.notifier_type, &config.params)
                    .map_err(|source| RegistryError::Notifier {
                        name: name.clone(),
                        source,
                    })?;
                info!("Notifier {} ({}) ready", name, config.notifier_type);
                Ok((name.clone(), notifier))
            })
            .collect()
    }
}
