//! Simulation driver module.
//!
//! Software model of the arm for development and testing without hardware.

mod driver;

pub use driver::SimulationDriver;

use cobot_common::device::driver::DeviceDriver;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn DeviceDriver> {
    Box::new(SimulationDriver::new())
}
