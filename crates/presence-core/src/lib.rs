//! # presence-core
//!
//! Domain layer for presence tracking: status values, entity references,
//! session credentials, the named events exchanged over the persistent channel,
//! and the REST payloads of the presence query endpoints.
//! This crate has zero dependencies on infrastructure (HTTP, WebSocket, runtime).

pub mod api;
pub mod credentials;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use api::{ApiResponse, BatchStatusRequest, BatchStatusData, StatusData};
pub use credentials::Credentials;
pub use events::{
    ChannelMessage, ConnectPayload, HeartbeatPayload, PresenceEventType, PresenceUpdatePayload,
    StatusPayload,
};
pub use value_objects::{DeviceType, EntityKind, EntityRef, PresenceStatus, StatusParseError};
