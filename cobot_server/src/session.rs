//! Device session: the single gate in front of the driver, and the dispatcher.
//!
//! A [`DeviceSession`] owns the process's only driver handle inside a
//! `parking_lot::Mutex`. Every driver call goes through a guard of that
//! mutex, so at most one call is in flight at any instant. The mutex is not
//! reentrant; helpers below take `&mut dyn DeviceDriver` from an already
//! held guard rather than locking again.
//!
//! Each gated operation is followed, under the same guard, by the error
//! read-and-clear: read the fault register, then reset it, so the next
//! command never observes a stale fault.

use crate::command::{Command, MoveCommand};
use cobot_common::device::consts::NO_FAULT;
use cobot_common::device::driver::{DeviceDriver, DeviceError};
use cobot_common::device::types::{ErrorCode, Pose, PoseKind};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reply code for any failure that carries no device fault code.
pub const FAILURE_CODE: ErrorCode = 1;

/// Dispatch failures. Neither escapes the connection handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The driver reported a device fault.
    #[error("device fault {0}")]
    DeviceFault(ErrorCode),

    /// The link is down or the driver failed for a non-fault reason.
    #[error("driver unavailable: {0}")]
    DriverUnavailable(DeviceError),
}

impl DispatchError {
    /// Reply code for this failure. Never zero.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DeviceFault(code) if *code != NO_FAULT => *code,
            _ => FAILURE_CODE,
        }
    }
}

impl From<DeviceError> for DispatchError {
    fn from(e: DeviceError) -> Self {
        match e {
            DeviceError::Fault(code) => Self::DeviceFault(code),
            other => Self::DriverUnavailable(other),
        }
    }
}

/// Immutable motion settings read at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Representation used for `G1` read-merge-write
    pub pose_mode: PoseKind,
    /// Feed rate for moves without an `F` word
    pub feed_rate: i32,
    /// Speed for `G30` and startup zeroing
    pub home_speed: i32,
    /// Hold the gate across the whole read-merge-write of a move
    pub hold_gate_across_move: bool,
    /// Move to the zero pose during startup
    pub home_on_startup: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        use cobot_common::consts::{DEFAULT_FEED_RATE, DEFAULT_HOME_SPEED};
        Self {
            pose_mode: PoseKind::default(),
            feed_rate: DEFAULT_FEED_RATE,
            home_speed: DEFAULT_HOME_SPEED,
            hold_gate_across_move: true,
            home_on_startup: true,
        }
    }
}

/// Read the fault register and reset it.
///
/// `outcome` is the result of the operation that just ran under the same
/// guard. The clear is attempted even when that operation failed.
fn settle(
    driver: &mut dyn DeviceDriver,
    outcome: Result<(), DeviceError>,
) -> Result<ErrorCode, DispatchError> {
    match outcome {
        Ok(()) => {
            let code = driver.get_error_code();
            let cleared = driver.clear_error_code();
            let code = code?;
            cleared?;
            Ok(code)
        }
        Err(e) => {
            clear_after_failure(driver);
            Err(e.into())
        }
    }
}

/// Best-effort clear once an operation has already failed.
fn clear_after_failure(driver: &mut dyn DeviceDriver) {
    if let Err(clear) = driver.clear_error_code() {
        warn!("Error clear after failed operation also failed: {}", clear);
    }
}

/// Overwrite the slots named by `mv`; labels of the other representation are ignored.
fn merge(mut pose: Pose, mv: &MoveCommand) -> Pose {
    for o in &mv.axis_overrides {
        if !pose.apply(o.label, o.value) {
            warn!(
                "Ignoring axis '{}': not valid in {} mode",
                o.label, pose.kind
            );
        }
    }
    pose
}

/// Owner of the driver handle and the exclusive access gate.
pub struct DeviceSession {
    driver: Mutex<Box<dyn DeviceDriver>>,
    settings: SessionSettings,
}

impl DeviceSession {
    /// Wrap an initialized driver.
    pub fn new(driver: Box<dyn DeviceDriver>, settings: SessionSettings) -> Self {
        Self {
            driver: Mutex::new(driver),
            settings,
        }
    }

    /// Run `f` with the gate held.
    fn locked<T>(&self, f: impl FnOnce(&mut dyn DeviceDriver) -> T) -> T {
        let mut guard = self.driver.lock();
        f(guard.as_mut())
    }

    /// Run one operation and its read-and-clear in a single gate acquisition.
    fn gated(
        &self,
        op: impl FnOnce(&mut dyn DeviceDriver) -> Result<(), DeviceError>,
    ) -> Result<ErrorCode, DispatchError> {
        self.locked(|driver| {
            let outcome = op(&mut *driver);
            settle(driver, outcome)
        })
    }

    /// Execute one command against the device.
    ///
    /// Blocks for as long as the driver does, which for `G30` and `G1` is
    /// the duration of the physical motion. Call from a blocking context.
    pub fn dispatch(&self, cmd: &Command) -> Result<ErrorCode, DispatchError> {
        debug!("Dispatching {}", cmd);
        let result = match cmd {
            Command::NoOp => Ok(NO_FAULT),
            Command::PowerOn => self.gated(|d| d.power_on()),
            Command::PowerOff => self.gated(|d| d.power_off()),
            Command::Home => {
                let speed = self.settings.home_speed;
                self.gated(|d| d.move_blocking(&Pose::zero(PoseKind::Angles), speed))
            }
            Command::Move(mv) => self.dispatch_move(mv),
            Command::Joint {
                joint,
                angle,
                speed,
            } => self.gated(|d| {
                let mut target = d.get_pose(PoseKind::Angles)?;
                target.apply(*joint, *angle);
                d.move_blocking(&target, *speed)
            }),
        };
        match &result {
            Ok(code) => debug!("{} -> {}", cmd, code),
            Err(e) => warn!("{} failed: {}", cmd, e),
        }
        result
    }

    fn dispatch_move(&self, mv: &MoveCommand) -> Result<ErrorCode, DispatchError> {
        let kind = self.settings.pose_mode;
        let feed_rate = mv.feed_rate.unwrap_or(self.settings.feed_rate);

        if self.settings.hold_gate_across_move {
            return self.gated(|d| {
                let target = merge(d.get_pose(kind)?, mv);
                d.move_blocking(&target, feed_rate)
            });
        }

        // Split form: another client may move the arm between the read and
        // the write; its effect on non-overridden axes is then overwritten.
        let current = self.locked(|d| {
            let read = d.get_pose(kind);
            if read.is_err() {
                clear_after_failure(d);
            }
            read
        })?;
        let target = merge(current, mv);
        self.gated(|d| d.move_blocking(&target, feed_rate))
    }

    /// Bring the arm into a known state before serving clients.
    ///
    /// Powers the servos if needed, optionally zeroes the joints, then
    /// clears any pending fault. The caller decides whether a failure here
    /// is fatal.
    pub fn startup(&self) -> Result<ErrorCode, DispatchError> {
        let home_on_startup = self.settings.home_on_startup;
        let home_speed = self.settings.home_speed;
        self.gated(|d| {
            if d.is_powered_on()? {
                info!("Already on");
            } else {
                info!("Powering on");
                d.power_on()?;
            }
            if home_on_startup {
                info!("Zeroing out");
                d.move_blocking(&Pose::zero(PoseKind::Angles), home_speed)?;
            }
            Ok(())
        })
    }

    /// Release the driver. Waits for any in-flight operation.
    pub fn shutdown(&self) -> Result<(), DeviceError> {
        self.locked(|d| {
            info!("Shutting down driver {}", d.name());
            d.shutdown()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;

    fn move_of(line: &str) -> MoveCommand {
        match parse(line) {
            Ok(Command::Move(mv)) => mv,
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn merge_overwrites_named_slots_only() {
        let current = Pose::coords([1, 2, 3, 4, 5, 6]);
        let merged = merge(current, &move_of("G1 Y20 C-60"));
        assert_eq!(merged.values, [1, 20, 3, 4, 5, -60]);
    }

    #[test]
    fn merge_ignores_other_representation() {
        let current = Pose::angles([1, 2, 3, 4, 5, 6]);
        let merged = merge(current, &move_of("G1 X100 2-40"));
        assert_eq!(merged.values, [1, -40, 3, 4, 5, 6]);
        assert_eq!(merged.kind, PoseKind::Angles);
    }

    #[test]
    fn dispatch_error_codes() {
        assert_eq!(DispatchError::DeviceFault(32).code(), 32);
        assert_eq!(DispatchError::DeviceFault(NO_FAULT).code(), FAILURE_CODE);
        assert_eq!(
            DispatchError::DriverUnavailable(DeviceError::NotInitialized).code(),
            FAILURE_CODE
        );
    }

    #[test]
    fn device_errors_classify() {
        assert_eq!(
            DispatchError::from(DeviceError::Fault(5)),
            DispatchError::DeviceFault(5)
        );
        assert!(matches!(
            DispatchError::from(DeviceError::Timeout("settle".into())),
            DispatchError::DriverUnavailable(DeviceError::Timeout(_))
        ));
    }

    #[test]
    fn default_settings() {
        let settings = SessionSettings::default();
        assert_eq!(settings.pose_mode, PoseKind::Coords);
        assert_eq!(settings.feed_rate, 50);
        assert_eq!(settings.home_speed, 50);
        assert!(settings.hold_gate_across_move);
    }
}
