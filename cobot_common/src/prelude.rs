//! Prelude module for common re-exports.
//!
//! ```rust
//! use cobot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Device ─────────────────────────────────────────────────────────
pub use crate::device::config::DeviceConfig;
pub use crate::device::consts::{AXIS_COUNT, NO_FAULT};
pub use crate::device::driver::{DeviceDriver, DeviceError, DriverFactory};
pub use crate::device::types::{AxisLabel, ErrorCode, Pose, PoseKind};
