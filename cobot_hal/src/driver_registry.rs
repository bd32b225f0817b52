//! Driver registry for device drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories. This uses constructor-injection rather than global state.

use cobot_common::device::config::DeviceConfig;
use cobot_common::device::driver::{DeviceDriver, DeviceError, DriverFactory};
use std::collections::HashMap;
use tracing::info;

use crate::drivers::register_all_drivers;

/// Registry of available device drivers.
///
/// Constructed at startup, populated via `register()`, and consulted once to
/// build the process's single device driver.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `DeviceError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn DeviceDriver>, DeviceError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| DeviceError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// Create the driver named in `config.driver` and initialize it.
    ///
    /// # Errors
    /// Returns `DeviceError::DriverNotFound` for unknown names, or whatever
    /// the driver's `init()` reports.
    pub fn open(&self, config: &DeviceConfig) -> Result<Box<dyn DeviceDriver>, DeviceError> {
        let mut driver = self.create_driver(&config.driver)?;
        info!("Created driver: {} v{}", driver.name(), driver.version());
        driver.init(config)?;
        Ok(driver)
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
