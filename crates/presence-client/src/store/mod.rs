//! Status Store
//!
//! In-memory cache of the last-known status per (kind, id). Entries are
//! created on first write and overwritten in arrival order; they are never
//! evicted. Uses `DashMap` so the channel reader, the REST fallback and
//! readers can touch it from different tasks.

use dashmap::DashMap;
use presence_core::{EntityKind, EntityRef, PresenceStatus};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the change broadcast; slow receivers lose the oldest events
const CHANGE_BUFFER_SIZE: usize = 256;

/// A write that inserted an entry or changed its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub entity: EntityRef,
    /// Value before the write (None for a new entry)
    pub previous: Option<PresenceStatus>,
    pub status: PresenceStatus,
}

struct StoreInner {
    users: DashMap<String, PresenceStatus>,
    profiles: DashMap<String, PresenceStatus>,
    changes: broadcast::Sender<StatusChange>,
}

/// Shared status cache, cheap to clone
#[derive(Clone)]
pub struct StatusStore {
    inner: Arc<StoreInner>,
}

impl StatusStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER_SIZE);
        Self {
            inner: Arc::new(StoreInner {
                users: DashMap::new(),
                profiles: DashMap::new(),
                changes,
            }),
        }
    }

    fn map(&self, kind: EntityKind) -> &DashMap<String, PresenceStatus> {
        match kind {
            EntityKind::User => &self.inner.users,
            EntityKind::Profile => &self.inner.profiles,
        }
    }

    /// Cached status, if any
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<PresenceStatus> {
        self.map(kind).get(id).map(|entry| *entry)
    }

    /// Insert or overwrite a status, returning the previous value
    pub fn set(
        &self,
        kind: EntityKind,
        id: impl Into<String>,
        status: PresenceStatus,
    ) -> Option<PresenceStatus> {
        let id = id.into();
        let previous = self.map(kind).insert(id.clone(), status);

        tracing::debug!(
            kind = %kind,
            entity_id = %id,
            status = %status,
            previous = ?previous,
            "Status cached"
        );

        if previous != Some(status) {
            // No receivers is fine
            let _ = self.inner.changes.send(StatusChange {
                entity: EntityRef::new(kind, id),
                previous,
                status,
            });
        }

        previous
    }

    /// Write many statuses of one kind, returning how many were written
    pub fn merge<I>(&self, kind: EntityKind, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, PresenceStatus)>,
    {
        let mut written = 0;
        for (id, status) in entries {
            self.set(kind, id, status);
            written += 1;
        }
        written
    }

    /// Number of cached entries of one kind
    pub fn len(&self, kind: EntityKind) -> usize {
        self.map(kind).len()
    }

    /// Check if no entry of one kind is cached
    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.map(kind).is_empty()
    }

    /// Receive every future [`StatusChange`]; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.changes.subscribe()
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStore")
            .field("users", &self.inner.users.len())
            .field("profiles", &self.inner.profiles.len())
            .finish()
    }
}
