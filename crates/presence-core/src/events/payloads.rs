//! Event payload structures

use crate::value_objects::{DeviceType, EntityRef, PresenceStatus};
use serde::{Deserialize, Serialize};

/// `presence:connect` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPayload {
    pub user_id: String,
    pub profile_id: String,
    pub device_type: DeviceType,
}

/// `presence:status` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: PresenceStatus,
}

/// `presence:heartbeat` payload (always `{}`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatPayload {}

/// `presence:update` payload
///
/// Either reference may be absent; when both are present each one is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub status: PresenceStatus,
}

impl PresenceUpdatePayload {
    /// Update for a single user
    #[must_use]
    pub fn for_user(user_id: impl Into<String>, status: PresenceStatus) -> Self {
        Self {
            user_id: Some(user_id.into()),
            profile_id: None,
            status,
        }
    }

    /// Update for a single profile
    #[must_use]
    pub fn for_profile(profile_id: impl Into<String>, status: PresenceStatus) -> Self {
        Self {
            user_id: None,
            profile_id: Some(profile_id.into()),
            status,
        }
    }

    /// Entities this update applies to
    #[must_use]
    pub fn entities(&self) -> Vec<EntityRef> {
        let mut entities = Vec::with_capacity(2);
        if let Some(id) = &self.user_id {
            entities.push(EntityRef::user(id.clone()));
        }
        if let Some(id) = &self.profile_id {
            entities.push(EntityRef::profile(id.clone()));
        }
        entities
    }
}
