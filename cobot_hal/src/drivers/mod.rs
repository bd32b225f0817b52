//! Device driver implementations.
//!
//! - [`simulation`] - Software arm model for development and testing
//! - [`mycobot`] - myCobot serial link (`serial` feature for the driver itself)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `DeviceDriver` trait from `cobot_common::device::driver`
//! 3. Register the factory in [`register_all_drivers`]

pub mod mycobot;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers into `registry`.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver);

    #[cfg(feature = "serial")]
    registry.register(mycobot::DRIVER_NAME, mycobot::create_driver);
}
