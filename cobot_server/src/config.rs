//! Server configuration.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "cobot-server"
//!
//! [server]
//! bind_address = "0.0.0.0"
//! port = 8765
//!
//! [device]
//! driver = "mycobot"
//! serial_port = "/dev/ttyS3"
//! baud_rate = 1000000
//! pose_mode = "coords"
//!
//! [motion]
//! feed_rate = 50
//! home_speed = 50
//! hold_gate_across_move = true
//! home_on_startup = true
//! legacy_joint_commands = false
//! ```

use crate::command::CommandParser;
use crate::session::SessionSettings;
use cobot_common::config::{ConfigError, SharedConfig};
use cobot_common::consts::{
    DEFAULT_BIND_ADDRESS, DEFAULT_FEED_RATE, DEFAULT_HOME_SPEED, DEFAULT_PORT, MAX_FEED_RATE,
    MIN_FEED_RATE,
};
use cobot_common::device::config::DeviceConfig;
use serde::{Deserialize, Serialize};

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_feed_rate() -> i32 {
    DEFAULT_FEED_RATE
}

fn default_home_speed() -> i32 {
    DEFAULT_HOME_SPEED
}

fn default_true() -> bool {
    true
}

/// `[server]` section: where to listen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    /// Interface address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl ListenConfig {
    /// `host:port` string for binding.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// `[motion]` section: command-level motion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionConfig {
    /// Feed rate for `G1` lines without an `F` word.
    #[serde(default = "default_feed_rate")]
    pub feed_rate: i32,
    /// Speed for `G30` and startup zeroing.
    #[serde(default = "default_home_speed")]
    pub home_speed: i32,
    /// Hold the gate across a move's pose read and write.
    #[serde(default = "default_true")]
    pub hold_gate_across_move: bool,
    /// Zero the joints before accepting connections.
    #[serde(default = "default_true")]
    pub home_on_startup: bool,
    /// Accept `<joint> <angle> <speed>` lines.
    #[serde(default)]
    pub legacy_joint_commands: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            feed_rate: default_feed_rate(),
            home_speed: default_home_speed(),
            hold_gate_across_move: true,
            home_on_startup: true,
            legacy_joint_commands: false,
        }
    }
}

/// Full server configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Shared settings.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Listener.
    #[serde(default)]
    pub server: ListenConfig,
    /// Device driver selection and link parameters.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Motion settings.
    #[serde(default)]
    pub motion: MotionConfig,
}

fn check_feed(name: &str, value: i32) -> Result<(), ConfigError> {
    if (MIN_FEED_RATE..=MAX_FEED_RATE).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "motion.{name} must be in {MIN_FEED_RATE}..={MAX_FEED_RATE}, got {value}"
        )))
    }
}

impl ServerConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.bind_address cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port cannot be 0".to_string(),
            ));
        }
        self.device.validate()?;
        check_feed("feed_rate", self.motion.feed_rate)?;
        check_feed("home_speed", self.motion.home_speed)?;
        Ok(())
    }

    /// Dispatch settings derived from `[device]` and `[motion]`.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            pose_mode: self.device.pose_mode,
            feed_rate: self.motion.feed_rate,
            home_speed: self.motion.home_speed,
            hold_gate_across_move: self.motion.hold_gate_across_move,
            home_on_startup: self.motion.home_on_startup,
        }
    }

    /// Line parser configured from `[motion]`.
    pub fn parser(&self) -> CommandParser {
        CommandParser::new(self.motion.legacy_joint_commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobot_common::config::ConfigLoader;
    use cobot_common::device::types::PoseKind;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.socket_addr(), "0.0.0.0:8765");
        assert_eq!(config.device.driver, "simulation");
        assert_eq!(config.session_settings(), SessionSettings::default());
        assert!(!config.parser().legacy_joint_commands);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = ServerConfig::parse(
            r#"
            [server]
            port = 9000

            [device]
            pose_mode = "angles"

            [motion]
            feed_rate = 80
            hold_gate_across_move = false
            legacy_joint_commands = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        let settings = config.session_settings();
        assert_eq!(settings.pose_mode, PoseKind::Angles);
        assert_eq!(settings.feed_rate, 80);
        assert_eq!(settings.home_speed, 50);
        assert!(!settings.hold_gate_across_move);
        assert!(config.parser().legacy_joint_commands);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = ServerConfig::default();
        config.motion.feed_rate = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.motion.home_speed = 101;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.shared.service_name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = ServerConfig::parse("[motion]\nfeedrate = 10\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[shared]\nlog_level = \"debug\"\n[server]\nport = 8800").unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8800);
        assert_eq!(config.shared.log_level.as_str(), "debug");
    }
}
