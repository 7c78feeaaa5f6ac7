//! Presence client configuration
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub app: ClientSettings,
    pub api: ApiConfig,
    pub channel: ChannelConfig,
}

/// General client settings
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub env: Environment,
    /// Host signal fed to the device-type heuristic
    pub user_agent: String,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// REST fallback configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://rewards.example.com`
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Persistent channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Channel URL, e.g. `wss://rewards.example.com/presence`
    pub url: String,
    pub heartbeat_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
}

impl ChannelConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

// Default value functions
fn default_user_agent() -> String {
    format!("presence-client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_ms() -> u64 {
    3_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

fn default_max_reconnect_attempts() -> u32 {
    2
}

impl PresenceConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: ClientSettings {
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
                user_agent: lookup("PRESENCE_USER_AGENT").unwrap_or_else(default_user_agent),
            },
            api: ApiConfig {
                base_url: required(&lookup, "PRESENCE_API_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                request_timeout_ms: millis(&lookup, "PRESENCE_REQUEST_TIMEOUT_MS")?
                    .unwrap_or_else(default_request_timeout_ms),
            },
            channel: ChannelConfig {
                url: required(&lookup, "PRESENCE_CHANNEL_URL")?,
                heartbeat_interval_ms: millis(&lookup, "PRESENCE_HEARTBEAT_INTERVAL_MS")?
                    .unwrap_or_else(default_heartbeat_interval_ms),
                reconnect_delay_ms: millis(&lookup, "PRESENCE_RECONNECT_DELAY_MS")?
                    .unwrap_or_else(default_reconnect_delay_ms),
                max_reconnect_attempts: parsed(&lookup, "PRESENCE_MAX_RECONNECT_ATTEMPTS")?
                    .unwrap_or_else(default_max_reconnect_attempts),
            },
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
    }
}

/// A duration in milliseconds; zero is rejected
fn millis<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(lookup, key)? {
        Some(0) => Err(ConfigError::InvalidValue(key, "0".to_string())),
        value => Ok(value),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
