//! # Cobot HAL Library
//!
//! Device drivers for the single robotic arm served by `cobot_server`, behind
//! a pluggable driver registry. Drivers implement the `DeviceDriver` trait
//! defined in `cobot_common::device::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (simulation, myCobot serial link)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   cobot_hal (single crate)                │
//! │  ┌─────────────────────┐        ┌──────────────────────┐  │
//! │  │  Driver Registry    │──────► │  DeviceDriver        │  │
//! │  │  name → factory     │        │  (trait object)      │  │
//! │  └─────────────────────┘        └──────────┬───────────┘  │
//! │                                            │              │
//! │                          ┌─────────────────┴───────────┐  │
//! │                          ▼                             ▼  │
//! │                 ┌────────────────┐       ┌──────────────┐ │
//! │                 │  simulation    │       │  mycobot     │ │
//! │                 │  (in-process)  │       │  (serial)    │ │
//! │                 └────────────────┘       └──────────────┘ │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod driver_registry;
pub mod drivers;

// Re-export key types for convenience
pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::register_all_drivers;
