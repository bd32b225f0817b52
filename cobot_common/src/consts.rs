//! Workspace-wide constants for the cobot server.
//!
//! Single source of truth for default paths, network endpoints and
//! motion defaults.

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cobot/server.toml";

/// Default service name used in logs.
pub const DEFAULT_SERVICE_NAME: &str = "cobot-server";

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default websocket port.
pub const DEFAULT_PORT: u16 = 8765;

/// Feed rate used by `G1` when the command carries no `F` word.
pub const DEFAULT_FEED_RATE: i32 = 50;

/// Speed used when homing to the zero pose.
pub const DEFAULT_HOME_SPEED: i32 = 50;

/// Lowest feed rate accepted by configuration.
pub const MIN_FEED_RATE: i32 = 1;

/// Highest feed rate accepted by configuration.
pub const MAX_FEED_RATE: i32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        assert!((MIN_FEED_RATE..=MAX_FEED_RATE).contains(&DEFAULT_FEED_RATE));
        assert!((MIN_FEED_RATE..=MAX_FEED_RATE).contains(&DEFAULT_HOME_SPEED));
        assert_ne!(DEFAULT_PORT, 0);
    }
}
