//! Generic type-name to factory registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::RegistryError;

/// Registry mapping a type name to a factory.
///
/// # Type Parameters
///
/// * `F` - The factory trait object (e.g. [`NotifierFactory`](super::NotifierFactory))
pub struct FactoryRegistry<F: ?Sized> {
    factories: DashMap<String, Arc<F>>,
}

impl<F: ?Sized> FactoryRegistry<F> {
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
        }
    }

    /// Register a factory.
    ///
    /// Returns an error if the type name is already taken.
    pub fn register(&self, type_name: impl Into<String>, factory: Arc<F>) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            return Err(RegistryError::AlreadyRegistered(type_name));
        }
        self.factories.insert(type_name, factory);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<F>> {
        self.factories.get(type_name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.iter().map(|entry| entry.key().clone()).collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<F: ?Sized> Default for FactoryRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
