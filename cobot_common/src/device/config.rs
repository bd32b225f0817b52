//! Device configuration types.
//!
//! `DeviceConfig` is the `[device]` section of the server configuration and
//! is handed to `DeviceDriver::init()`.
//!
//! # TOML Example
//!
//! ```toml
//! [device]
//! driver = "mycobot"
//! serial_port = "/dev/ttyS3"
//! baud_rate = 1000000
//! pose_mode = "coords"
//! ```

use super::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_DRIVER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERIAL_PORT,
    DEFAULT_SETTLE_TIMEOUT_MS,
};
use super::types::PoseKind;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_serial_port() -> String {
    DEFAULT_SERIAL_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_settle_timeout_ms() -> u64 {
    DEFAULT_SETTLE_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Device link and driver selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Registered driver name (e.g., "simulation", "mycobot").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Serial device path for hardware drivers.
    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    /// Serial baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Pose representation used by `G1` moves.
    #[serde(default)]
    pub pose_mode: PoseKind,

    /// Upper bound on waiting for a blocking move to settle.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Interval between in-position polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Simulation only: seconds of simulated motion per unit of
    /// `max slot delta / feed rate`. Zero makes simulated moves instant.
    #[serde(default)]
    pub motion_time_scale: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            pose_mode: PoseKind::default(),
            settle_timeout_ms: default_settle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            motion_time_scale: 0.0,
        }
    }
}

impl DeviceConfig {
    /// Settle timeout as a `Duration`.
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `driver` is empty
    /// - `baud_rate` is zero
    /// - `poll_interval_ms` is zero or exceeds `settle_timeout_ms`
    /// - `motion_time_scale` is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "device.driver cannot be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "device.baud_rate must be positive".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.settle_timeout_ms {
            return Err(ConfigError::ValidationError(format!(
                "device.poll_interval_ms must be in 1..={}",
                self.settle_timeout_ms
            )));
        }
        if !self.motion_time_scale.is_finite() || self.motion_time_scale < 0.0 {
            return Err(ConfigError::ValidationError(
                "device.motion_time_scale must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}
