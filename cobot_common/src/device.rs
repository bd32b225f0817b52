//! Device abstraction: driver contract, pose types and configuration.
//!
//! The physical arm is reached exclusively through the [`driver::DeviceDriver`]
//! trait. Everything a driver needs to be constructed lives in
//! [`config::DeviceConfig`].

pub mod config;
pub mod consts;
pub mod driver;
pub mod types;
