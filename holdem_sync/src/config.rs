//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::time::Duration;

/// Server URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Path of the game channel on the server.
pub const GAME_CHANNEL_PATH: &str = "/ws/game";

/// Path of the auto-play status endpoint on the server.
pub const STATUS_PATH: &str = "/api/game/auto/status";

/// Rule applied after an unexpected connection loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay between a drop and the next attempt
    pub delay: Duration,
    /// Consecutive failed attempts before giving up (`None` retries forever)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base URL of the game server (e.g. `http://localhost:8080`)
    pub server_url: String,
    /// Reconnection rule
    pub reconnect: ReconnectPolicy,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Maximum number of activity log entries kept
    pub log_capacity: usize,
    /// Time allowed for the socket handshake
    pub connect_timeout: Duration,
    /// Reject actions locally when it is not our turn
    pub local_turn_gating: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            poll_interval: Duration::from_secs(5),
            log_capacity: 50,
            connect_timeout: Duration::from_secs(10),
            local_turn_gating: true,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the server.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - `HOLDEM_SERVER_URL`: HTTP base URL of the server
    /// - `HOLDEM_RECONNECT_DELAY_MS`: Delay before reconnecting (default: 3000)
    /// - `HOLDEM_RECONNECT_MAX_ATTEMPTS`: Give up after N failures (default: unlimited)
    /// - `HOLDEM_POLL_INTERVAL_MS`: Status poll interval (default: 5000)
    /// - `HOLDEM_LOG_CAPACITY`: Activity log size (default: 50)
    /// - `HOLDEM_CONNECT_TIMEOUT_MS`: Handshake timeout (default: 10000)
    /// - `HOLDEM_LOCAL_TURN_GATING`: Reject out-of-turn actions locally (default: true)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = lookup("HOLDEM_SERVER_URL").unwrap_or(defaults.server_url);

        let reconnect = ReconnectPolicy {
            delay: Duration::from_millis(parse_or(
                &lookup,
                "HOLDEM_RECONNECT_DELAY_MS",
                defaults.reconnect.delay.as_millis() as u64,
            )),
            max_attempts: lookup("HOLDEM_RECONNECT_MAX_ATTEMPTS").and_then(|v| v.parse().ok()),
        };

        let config = Self {
            server_url,
            reconnect,
            poll_interval: Duration::from_millis(parse_or(
                &lookup,
                "HOLDEM_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            log_capacity: parse_or(&lookup, "HOLDEM_LOG_CAPACITY", defaults.log_capacity),
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "HOLDEM_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout.as_millis() as u64,
            )),
            local_turn_gating: parse_or(
                &lookup,
                "HOLDEM_LOCAL_TURN_GATING",
                defaults.local_turn_gating,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_SERVER_URL".to_string(),
                reason: format!("Must start with http:// or https:// (got '{}')", self.server_url),
            });
        }

        if self.reconnect.delay.is_zero() {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_RECONNECT_DELAY_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.reconnect.max_attempts == Some(0) {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_RECONNECT_MAX_ATTEMPTS".to_string(),
                reason: "Must be at least 1 when set".to_string(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_POLL_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_LOG_CAPACITY".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// WebSocket URL of the game channel, derived from the HTTP base URL.
    pub fn game_channel_url(&self) -> String {
        let ws_base = self
            .server_url
            .trim_end_matches('/')
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{ws_base}{GAME_CHANNEL_PATH}")
    }

    /// HTTP URL of the auto-play status endpoint.
    pub fn status_url(&self) -> String {
        format!("{}{STATUS_PATH}", self.server_url.trim_end_matches('/'))
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
