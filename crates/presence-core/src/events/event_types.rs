//! Channel event names

use std::fmt;

/// Named events carried over the presence channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceEventType {
    /// Outbound: identity announcement, sent once per connection
    Connect,
    /// Outbound: local status changed
    Status,
    /// Outbound: keep-alive
    Heartbeat,
    /// Inbound: another entity's status changed
    Update,
}

impl PresenceEventType {
    /// Get the wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "presence:connect",
            Self::Status => "presence:status",
            Self::Heartbeat => "presence:heartbeat",
            Self::Update => "presence:update",
        }
    }

    /// Parse an event name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "presence:connect" => Some(Self::Connect),
            "presence:status" => Some(Self::Status),
            "presence:heartbeat" => Some(Self::Heartbeat),
            "presence:update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl fmt::Display for PresenceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
