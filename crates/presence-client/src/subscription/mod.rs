//! Subscription Registry
//!
//! Reference-counted interest per (kind, id). An id stays subscribed until
//! every `subscribe` has been matched by an `unsubscribe`.

use dashmap::DashMap;
use presence_core::EntityKind;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Tracks which entities the local client wants statuses for
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    users: Arc<DashMap<String, usize>>,
    profiles: Arc<DashMap<String, usize>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: EntityKind) -> &DashMap<String, usize> {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Profile => &self.profiles,
        }
    }

    /// Add interest in `ids`, returning the ids that were not subscribed before
    ///
    /// Duplicates within one call count once.
    pub fn subscribe<I, S>(&self, kind: EntityKind, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = self.map(kind);
        let mut added = Vec::new();

        for id in dedup(ids) {
            let mut count = map.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                added.push(id);
            }
        }

        tracing::debug!(
            kind = %kind,
            added = added.len(),
            total = map.len(),
            "Subscribed"
        );

        added
    }

    /// Drop interest in `ids`, returning the ids released entirely
    ///
    /// Unknown ids are ignored.
    pub fn unsubscribe<I, S>(&self, kind: EntityKind, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = self.map(kind);
        let mut released = Vec::new();

        for id in dedup(ids) {
            let removed = map.remove_if_mut(&id, |_, count| {
                *count = count.saturating_sub(1);
                *count == 0
            });
            if removed.is_some() {
                released.push(id);
            }
        }

        tracing::debug!(
            kind = %kind,
            released = released.len(),
            total = map.len(),
            "Unsubscribed"
        );

        released
    }

    /// All subscribed ids of one kind, sorted
    pub fn snapshot(&self, kind: EntityKind) -> Vec<String> {
        let mut ids: Vec<String> = self.map(kind).iter().map(|e| e.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if an id is subscribed
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.map(kind).contains_key(id)
    }

    /// Outstanding subscriptions on one id
    pub fn count(&self, kind: EntityKind, id: &str) -> usize {
        self.map(kind).get(id).map_or(0, |c| *c)
    }

    /// Number of subscribed ids of one kind
    pub fn len(&self, kind: EntityKind) -> usize {
        self.map(kind).len()
    }

    /// Check if nothing of one kind is subscribed
    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.map(kind).is_empty()
    }
}

/// Unique ids in first-seen order
fn dedup<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .map(Into::into)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
