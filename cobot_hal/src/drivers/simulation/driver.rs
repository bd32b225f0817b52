//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `DeviceDriver` trait with an
//! in-process arm model: servo power, a joint-angle vector, a cartesian
//! vector and a fault register. There is no kinematic coupling between the
//! two vectors; each representation moves only when targeted.

use cobot_common::device::config::DeviceConfig;
use cobot_common::device::consts::{
    AXIS_COUNT, JOINT_LIMIT_DEG, NO_FAULT, SIM_FAULT_JOINT_LIMIT, SIM_FAULT_NOT_POWERED,
};
use cobot_common::device::driver::{DeviceDriver, DeviceError};
use cobot_common::device::types::{ErrorCode, Pose, PoseKind};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Simulation driver implementing the DeviceDriver trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Initialized flag
    initialized: bool,
    /// Servo power
    powered: bool,
    /// Joint angles in degrees
    angles: [i32; AXIS_COUNT],
    /// Cartesian coordinates
    coords: [i32; AXIS_COUNT],
    /// Fault register
    fault: ErrorCode,
    /// Seconds per unit of `max delta / feed rate`
    motion_time_scale: f64,
    /// Completed moves
    move_count: u64,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            name: super::DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            initialized: false,
            powered: false,
            angles: [0; AXIS_COUNT],
            coords: [0; AXIS_COUNT],
            fault: NO_FAULT,
            motion_time_scale: 0.0,
            move_count: 0,
        }
    }

    /// Number of moves that reached their target.
    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    fn ensure_initialized(&self) -> Result<(), DeviceError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DeviceError::NotInitialized)
        }
    }

    fn slots_mut(&mut self, kind: PoseKind) -> &mut [i32; AXIS_COUNT] {
        match kind {
            PoseKind::Angles => &mut self.angles,
            PoseKind::Coords => &mut self.coords,
        }
    }

    /// Simulated travel time for a move from `from` to `to`.
    fn travel_time(&self, from: &[i32; AXIS_COUNT], to: &[i32; AXIS_COUNT], feed_rate: i32) -> Duration {
        let max_delta = from
            .iter()
            .zip(to)
            .map(|(a, b)| (i64::from(*a) - i64::from(*b)).unsigned_abs())
            .max()
            .unwrap_or(0);
        let secs = self.motion_time_scale * max_delta as f64 / f64::from(feed_rate.max(1));
        Duration::from_secs_f64(secs)
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &DeviceConfig) -> Result<(), DeviceError> {
        info!(
            "Initializing simulation driver (pose_mode={}, motion_time_scale={})",
            config.pose_mode, config.motion_time_scale
        );
        if !config.motion_time_scale.is_finite() || config.motion_time_scale < 0.0 {
            return Err(DeviceError::ConfigError(format!(
                "invalid motion_time_scale {}",
                config.motion_time_scale
            )));
        }
        self.motion_time_scale = config.motion_time_scale;
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), DeviceError> {
        info!(
            "Simulation driver shutdown after {} moves (powered={})",
            self.move_count, self.powered
        );
        self.initialized = false;
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), DeviceError> {
        self.ensure_initialized()?;
        self.powered = true;
        debug!("Simulated servos powered on");
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), DeviceError> {
        self.ensure_initialized()?;
        self.powered = false;
        debug!("Simulated servos powered off");
        Ok(())
    }

    fn is_powered_on(&mut self) -> Result<bool, DeviceError> {
        self.ensure_initialized()?;
        Ok(self.powered)
    }

    fn get_pose(&mut self, kind: PoseKind) -> Result<Pose, DeviceError> {
        self.ensure_initialized()?;
        let values = *self.slots_mut(kind);
        Ok(Pose { kind, values })
    }

    fn move_blocking(&mut self, target: &Pose, feed_rate: i32) -> Result<(), DeviceError> {
        self.ensure_initialized()?;

        // An unpowered arm ignores motion and latches a fault.
        if !self.powered {
            warn!("Move to {} ignored: servos are off", target);
            self.fault = SIM_FAULT_NOT_POWERED;
            return Ok(());
        }

        if target.kind == PoseKind::Angles
            && target.values.iter().any(|v| v.abs() > JOINT_LIMIT_DEG)
        {
            warn!("Move to {} rejected: joint limit ±{}", target, JOINT_LIMIT_DEG);
            self.fault = SIM_FAULT_JOINT_LIMIT;
            return Err(DeviceError::Fault(SIM_FAULT_JOINT_LIMIT));
        }

        let current = *self.slots_mut(target.kind);
        let travel = self.travel_time(&current, &target.values, feed_rate);
        if !travel.is_zero() {
            std::thread::sleep(travel);
        }

        *self.slots_mut(target.kind) = target.values;
        self.move_count += 1;
        debug!("Simulated move to {} at feed {} took {:?}", target, feed_rate, travel);
        Ok(())
    }

    fn get_error_code(&mut self) -> Result<ErrorCode, DeviceError> {
        self.ensure_initialized()?;
        Ok(self.fault)
    }

    fn clear_error_code(&mut self) -> Result<(), DeviceError> {
        self.ensure_initialized()?;
        self.fault = NO_FAULT;
        Ok(())
    }
}
