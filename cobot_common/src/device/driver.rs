//! Device driver trait and error types.
//!
//! This module defines:
//! - `DeviceDriver` trait - Capability set of the single physical arm
//! - `DeviceError` enum - Error types for device operations
//! - `DriverFactory` type alias - Factory function type

use super::config::DeviceConfig;
use super::types::{ErrorCode, Pose, PoseKind};
use thiserror::Error;

/// Error types for device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware link error (port closed, framing error, short read)
    #[error("Device communication error: {0}")]
    CommunicationError(String),

    /// The device rejected the operation and reported a fault code
    #[error("Device fault {0}")]
    Fault(ErrorCode),

    /// The device did not settle in time
    #[error("Device timeout: {0}")]
    Timeout(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Operation issued before `init()`
    #[error("Driver not initialized")]
    NotInitialized,
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn DeviceDriver>;

/// Capability set of the physical arm.
///
/// Every call is synchronous from the caller's point of view and reports
/// failure through `DeviceError` rather than panicking. Implementations are
/// not required to tolerate concurrent use: callers hold the device session
/// gate around every call, so all methods take `&mut self`.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the first command
/// 2. capability calls - serialized, one at a time
/// 3. `shutdown()` - Called when the server is stopping
///
/// # Timing Contracts
///
/// | Operation | Duration |
/// |-----------|----------|
/// | `init()` | bounded by link setup |
/// | `move_blocking()` | until motion completes (seconds) |
/// | everything else | one link round trip |
pub trait DeviceDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation", "mycobot").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Open the link and prepare the driver.
    ///
    /// # Errors
    /// Return `DeviceError::InitFailed` if the link cannot be established.
    fn init(&mut self, config: &DeviceConfig) -> Result<(), DeviceError>;

    /// Close the link and release resources.
    fn shutdown(&mut self) -> Result<(), DeviceError>;

    /// Power the servos on. Idempotent.
    fn power_on(&mut self) -> Result<(), DeviceError>;

    /// Power the servos off. Idempotent.
    fn power_off(&mut self) -> Result<(), DeviceError>;

    /// Query servo power state.
    fn is_powered_on(&mut self) -> Result<bool, DeviceError>;

    /// Read the current pose in the requested representation.
    fn get_pose(&mut self, kind: PoseKind) -> Result<Pose, DeviceError>;

    /// Move to `target` at `feed_rate` and return once motion has settled.
    fn move_blocking(&mut self, target: &Pose, feed_rate: i32) -> Result<(), DeviceError>;

    /// Read the device fault register.
    fn get_error_code(&mut self) -> Result<ErrorCode, DeviceError>;

    /// Reset the device fault register.
    fn clear_error_code(&mut self) -> Result<(), DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::consts::NO_FAULT;

    #[derive(Default)]
    struct TestDriver {
        powered: bool,
        pose: Option<Pose>,
        fault: ErrorCode,
    }

    impl DeviceDriver for TestDriver {
        fn name(&self) -> &'static str {
            "test"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn init(&mut self, config: &DeviceConfig) -> Result<(), DeviceError> {
            self.pose = Some(Pose::zero(config.pose_mode));
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), DeviceError> {
            self.pose = None;
            Ok(())
        }

        fn power_on(&mut self) -> Result<(), DeviceError> {
            self.powered = true;
            Ok(())
        }

        fn power_off(&mut self) -> Result<(), DeviceError> {
            self.powered = false;
            Ok(())
        }

        fn is_powered_on(&mut self) -> Result<bool, DeviceError> {
            Ok(self.powered)
        }

        fn get_pose(&mut self, _kind: PoseKind) -> Result<Pose, DeviceError> {
            self.pose.ok_or(DeviceError::NotInitialized)
        }

        fn move_blocking(&mut self, target: &Pose, _feed_rate: i32) -> Result<(), DeviceError> {
            if !self.powered {
                self.fault = 7;
                return Err(DeviceError::Fault(7));
            }
            self.pose = Some(*target);
            Ok(())
        }

        fn get_error_code(&mut self) -> Result<ErrorCode, DeviceError> {
            Ok(self.fault)
        }

        fn clear_error_code(&mut self) -> Result<(), DeviceError> {
            self.fault = NO_FAULT;
            Ok(())
        }
    }

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::InitFailed("no port".to_string());
        assert!(err.to_string().contains("no port"));

        let err = DeviceError::Fault(33);
        assert_eq!(err.to_string(), "Device fault 33");

        let err = DeviceError::DriverNotFound("ethercat".to_string());
        assert!(err.to_string().contains("ethercat"));
    }

    #[test]
    fn test_driver_through_trait_object() {
        let mut driver: Box<dyn DeviceDriver> = Box::new(TestDriver::default());
        assert_eq!(driver.get_pose(PoseKind::Coords), Err(DeviceError::NotInitialized));

        driver.init(&DeviceConfig::default()).unwrap();
        assert_eq!(
            driver.move_blocking(&Pose::coords([1, 0, 0, 0, 0, 0]), 50),
            Err(DeviceError::Fault(7))
        );
        assert_eq!(driver.get_error_code().unwrap(), 7);
        driver.clear_error_code().unwrap();
        assert_eq!(driver.get_error_code().unwrap(), NO_FAULT);

        driver.power_on().unwrap();
        assert!(driver.is_powered_on().unwrap());
        driver
            .move_blocking(&Pose::coords([1, 0, 0, 0, 0, 0]), 50)
            .unwrap();
        assert_eq!(
            driver.get_pose(PoseKind::Coords).unwrap().values,
            [1, 0, 0, 0, 0, 0]
        );
    }
}
