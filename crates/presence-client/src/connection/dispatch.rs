//! Inbound event routing
//!
//! Pushed events go straight into the status cache.

use crate::store::StatusStore;
use presence_core::{ChannelMessage, PresenceEventType, PresenceUpdatePayload};

/// Routes server-pushed events
pub struct InboundDispatcher;

impl InboundDispatcher {
    /// Apply one inbound event, returning how many cache entries were written
    pub fn dispatch(store: &StatusStore, message: &ChannelMessage) -> usize {
        match message.event_type() {
            Some(PresenceEventType::Update) => Self::apply_update(store, message),
            Some(event) => {
                tracing::debug!(event = %event, "Ignoring outbound-only event from server");
                0
            }
            None => {
                tracing::trace!(event = %message.event, "Ignoring unknown event");
                0
            }
        }
    }

    fn apply_update(store: &StatusStore, message: &ChannelMessage) -> usize {
        let payload: PresenceUpdatePayload = match message.decode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, data = %message.data, "Dropping malformed presence update");
                return 0;
            }
        };

        let entities = payload.entities();
        if entities.is_empty() {
            tracing::debug!(status = %payload.status, "Presence update names no entity");
        }

        for entity in &entities {
            store.set(entity.kind, entity.id.clone(), payload.status);
        }

        entities.len()
    }
}
