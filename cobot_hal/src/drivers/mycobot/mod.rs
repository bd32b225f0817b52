//! myCobot serial link driver.
//!
//! [`frame`] holds the wire codec and is always built. The driver itself
//! needs the `serial` feature, which pulls in `serialport`.

pub mod frame;

#[cfg(feature = "serial")]
mod driver;

#[cfg(feature = "serial")]
pub use driver::MyCobotDriver;

/// Registry name of the myCobot driver.
pub const DRIVER_NAME: &str = "mycobot";

/// Factory function to create a myCobot driver instance.
#[cfg(feature = "serial")]
pub fn create_driver() -> Box<dyn cobot_common::device::driver::DeviceDriver> {
    Box::new(MyCobotDriver::new())
}
