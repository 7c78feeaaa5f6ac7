//! Channel message envelope
//!
//! Every frame on the channel is `{ "event": <name>, "data": <payload> }`.

use super::{ConnectPayload, HeartbeatPayload, PresenceEventType, PresenceUpdatePayload, StatusPayload};
use crate::value_objects::PresenceStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named event with a JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Event name, e.g. `presence:update`
    pub event: String,

    /// Event payload
    #[serde(default)]
    pub data: Value,
}

impl ChannelMessage {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    // === Outbound ===

    /// Create a `presence:connect` message
    #[must_use]
    pub fn connect(payload: &ConnectPayload) -> Self {
        Self::new(
            PresenceEventType::Connect.as_str(),
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a `presence:status` message
    #[must_use]
    pub fn status(status: PresenceStatus) -> Self {
        Self::new(
            PresenceEventType::Status.as_str(),
            serde_json::to_value(StatusPayload { status }).unwrap_or_default(),
        )
    }

    /// Create a `presence:heartbeat` message
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(
            PresenceEventType::Heartbeat.as_str(),
            serde_json::to_value(HeartbeatPayload {}).unwrap_or_default(),
        )
    }

    // === Inbound ===

    /// Create a `presence:update` message
    #[must_use]
    pub fn update(payload: &PresenceUpdatePayload) -> Self {
        Self::new(
            PresenceEventType::Update.as_str(),
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    // === Accessors ===

    /// Known event type, if any
    #[must_use]
    pub fn event_type(&self) -> Option<PresenceEventType> {
        PresenceEventType::from_str(&self.event)
    }

    /// Decode the payload into a typed structure
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Decode as a `presence:update` payload (None for any other event)
    #[must_use]
    pub fn as_update(&self) -> Option<PresenceUpdatePayload> {
        if self.event_type() != Some(PresenceEventType::Update) {
            return None;
        }
        self.decode().ok()
    }

    /// Decode as a `presence:status` payload (None for any other event)
    #[must_use]
    pub fn as_status(&self) -> Option<StatusPayload> {
        if self.event_type() != Some(PresenceEventType::Status) {
            return None;
        }
        self.decode().ok()
    }

    /// Decode as a `presence:connect` payload (None for any other event)
    #[must_use]
    pub fn as_connect(&self) -> Option<ConnectPayload> {
        if self.event_type() != Some(PresenceEventType::Connect) {
            return None;
        }
        self.decode().ok()
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::DeviceType;
    use serde_json::json;

    #[test]
    fn test_status_message() {
        let msg = ChannelMessage::status(PresenceStatus::Away);
        assert_eq!(msg.event, "presence:status");
        assert_eq!(msg.data, json!({"status": "away"}));
        assert_eq!(msg.as_status().unwrap().status, PresenceStatus::Away);
    }

    #[test]
    fn test_heartbeat_message() {
        let msg = ChannelMessage::heartbeat();
        assert_eq!(msg.to_json().unwrap(), r#"{"event":"presence:heartbeat","data":{}}"#);
    }

    #[test]
    fn test_connect_message() {
        let payload = ConnectPayload {
            user_id: "u1".to_string(),
            profile_id: "p1".to_string(),
            device_type: DeviceType::Mobile,
        };
        let msg = ChannelMessage::connect(&payload);

        assert_eq!(msg.event_type(), Some(PresenceEventType::Connect));
        assert_eq!(msg.as_connect(), Some(payload));
        assert!(msg.as_status().is_none());
    }

    #[test]
    fn test_parse_inbound_update() {
        let msg = ChannelMessage::from_json(
            r#"{"event":"presence:update","data":{"userId":"u7","status":"busy"}}"#,
        )
        .unwrap();

        let update = msg.as_update().unwrap();
        assert_eq!(update.user_id.as_deref(), Some("u7"));
        assert_eq!(update.status, PresenceStatus::Busy);
    }

    #[test]
    fn test_unknown_event() {
        let msg = ChannelMessage::from_json(r#"{"event":"presence:typing"}"#).unwrap();
        assert_eq!(msg.event_type(), None);
        assert_eq!(msg.data, Value::Null);
        assert!(msg.as_update().is_none());
    }
}
