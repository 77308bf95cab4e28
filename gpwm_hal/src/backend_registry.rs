//! Backend registry for register mappers.
//!
//! Provides a `BackendRegistry` struct for registering and retrieving
//! register backend factories by name. Constructed at startup and passed
//! by value; no global state.

use crate::backends::register_builtin_backends;
use crate::register::RegisterMapper;
use gpwm_common::config::DeviceConfig;
use gpwm_common::error::{PwmError, PwmResult};
use std::collections::HashMap;

/// Factory function type for creating backend instances.
pub type BackendFactory = fn(&DeviceConfig) -> Box<dyn RegisterMapper>;

/// Registry of available register backends.
pub struct BackendRegistry {
    factories: HashMap<&'static str, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_backends(&mut registry);
        registry
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        if self.factories.contains_key(name) {
            panic!("Backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a backend instance by name.
    ///
    /// # Errors
    /// Returns `PwmError::BackendNotFound` if no backend with the given name is registered.
    pub fn create(&self, name: &str, config: &DeviceConfig) -> PwmResult<Box<dyn RegisterMapper>> {
        let factory = self
            .factories
            .get(name)
            .copied()
            .ok_or_else(|| PwmError::BackendNotFound(name.to_string()))?;
        Ok(factory(config))
    }

    /// List all registered backend names.
    pub fn list(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
