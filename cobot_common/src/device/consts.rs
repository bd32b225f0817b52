//! Device constants.
//!
//! Defaults for the device link and the fault codes reported by the
//! built-in simulation driver.

use super::types::ErrorCode;

/// Number of slots in a pose vector (six joints or six cartesian components).
pub const AXIS_COUNT: usize = 6;

/// Fault register value meaning "no fault".
pub const NO_FAULT: ErrorCode = 0;

/// Default driver name.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default serial device for the arm's control link.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyS3";

/// Default baud rate of the arm's control link.
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

/// Default upper bound on waiting for a blocking move to settle.
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 15_000;

/// Default interval between in-position polls during a blocking move.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Mechanical joint limit in degrees (symmetric).
pub const JOINT_LIMIT_DEG: i32 = 165;

/// Simulation fault: motion requested while the arm is unpowered.
pub const SIM_FAULT_NOT_POWERED: ErrorCode = 32;

/// Simulation fault: joint target outside [`JOINT_LIMIT_DEG`].
pub const SIM_FAULT_JOINT_LIMIT: ErrorCode = 33;
