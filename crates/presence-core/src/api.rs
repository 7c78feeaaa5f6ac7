//! REST payloads of the presence query endpoints
//!
//! - `GET  /api/presence/status/{userId}`
//! - `GET  /api/presence/profile/{profileId}`
//! - `POST /api/presence/batch`

use crate::value_objects::PresenceStatus;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Response envelope shared by all presence endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self {
            success: false,
            data: None,
        }
    }

    /// Payload of a successful response
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// `data` of a single-entity lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub status: PresenceStatus,
}

/// Body of `POST /api/presence/batch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    pub user_ids: Vec<String>,
}

/// `data` of a batch lookup
///
/// Entries whose status is not recognised are skipped one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatusData {
    #[serde(default, deserialize_with = "known_statuses")]
    pub statuses: HashMap<String, PresenceStatus>,
}

fn known_statuses<'de, D>(deserializer: D) -> Result<HashMap<String, PresenceStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| {
            let status = value.as_str()?.parse().ok()?;
            Some((id, status))
        })
        .collect())
}
