//! Presence status value

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Live availability of a user or profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Connected and active
    Online,
    /// Not connected, or unknown
    #[default]
    Offline,
    /// Connected but not looking (e.g. the page is hidden)
    Away,
    /// Connected, do not disturb
    Busy,
}

impl PresenceStatus {
    /// Get the wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Away => "away",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid presence status: {0}")]
pub struct StatusParseError(pub String);

impl FromStr for PresenceStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}
