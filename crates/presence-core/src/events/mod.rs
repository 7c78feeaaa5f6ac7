//! Persistent-channel events
//!
//! Every event is a name plus a JSON payload. Delivery is fire-and-forget.

mod event_types;
mod message;
mod payloads;

pub use event_types::PresenceEventType;
pub use message::ChannelMessage;
pub use payloads::{ConnectPayload, HeartbeatPayload, PresenceUpdatePayload, StatusPayload};
