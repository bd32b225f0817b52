//! Startup and transport errors of the server binary.

use cobot_common::config::ConfigError;
use cobot_common::device::driver::DeviceError;
use thiserror::Error;

/// Failures that stop the server. Command handling never produces these.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The driver could not be created or initialized.
    #[error("device: {0}")]
    Device(#[from] DeviceError),

    /// Socket failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task panicked or was cancelled.
    #[error("task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
