//! Cobot Common Library
//!
//! This crate provides shared constants, configuration loading utilities and
//! the device driver contract for all cobot workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`device`] - Device driver trait, pose types and device configuration
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use cobot_common::device::types::{AxisLabel, Pose, PoseKind};
//!
//! let mut pose = Pose::zero(PoseKind::Coords);
//! assert!(pose.apply(AxisLabel::X, 100));
//! assert_eq!(pose.values, [100, 0, 0, 0, 0, 0]);
//! ```

pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
