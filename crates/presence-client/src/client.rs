//! Presence Client
//!
//! Facade wiring the store, subscriptions, fallback, and connection
//! together. Reads never fail: a missing or unreachable status reads as
//! `offline`.

use crate::connection::{ConnectionConfig, ConnectionManager};
use crate::environment::EnvironmentMonitor;
use crate::error::ClientError;
use crate::fallback::{FallbackClient, FallbackConfig};
use crate::store::{StatusChange, StatusStore};
use crate::subscription::SubscriptionRegistry;
use crate::transport::{Transport, WebSocketTransport};
use presence_common::PresenceConfig;
use presence_core::{Credentials, EntityKind, PresenceStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Live presence for a set of users and profiles
#[derive(Debug, Clone)]
pub struct PresenceClient {
    store: StatusStore,
    registry: SubscriptionRegistry,
    fallback: FallbackClient,
    connection: ConnectionManager,
    environment: EnvironmentMonitor,
}

impl PresenceClient {
    /// Build a disconnected client over `transport`
    pub fn new(
        fallback: FallbackConfig,
        connection: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let store = StatusStore::new();
        let fallback = FallbackClient::new(fallback, store.clone())?;
        let connection = ConnectionManager::new(transport, store.clone(), connection);
        let environment = EnvironmentMonitor::new(connection.clone());

        Ok(Self {
            store,
            registry: SubscriptionRegistry::new(),
            fallback,
            connection,
            environment,
        })
    }

    /// Build a client speaking WebSocket to the configured channel URL
    pub fn from_config(config: &PresenceConfig) -> Result<Self, ClientError> {
        Self::new(
            FallbackConfig::from(&config.api),
            ConnectionConfig::from(config),
            Arc::new(WebSocketTransport::new(config.channel.url.clone())),
        )
    }

    /// Authenticate the fallback and open the channel
    ///
    /// Returns whether the channel opened; a failed open still retries.
    pub async fn init(&self, credentials: Credentials) -> bool {
        self.fallback.set_token(Some(credentials.token.clone()));
        self.connection.connect(credentials).await
    }

    /// Close the channel and drop credentials
    pub fn shutdown(&self) {
        self.connection.shutdown();
        self.fallback.set_token(None);
    }

    /// Subscribe to users and refresh the whole user set in one batch
    pub async fn subscribe_to_users<I, S>(&self, ids: I) -> HashMap<String, PresenceStatus>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.subscribe(EntityKind::User, ids);
        let all = self.registry.snapshot(EntityKind::User);
        self.fallback.fetch_batch(&all).await
    }

    /// Subscribe to profiles, reading each one in turn
    pub async fn subscribe_to_profiles<I, S>(&self, ids: I) -> HashMap<String, PresenceStatus>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        self.registry.subscribe(EntityKind::Profile, ids.iter().cloned());

        let mut statuses = HashMap::with_capacity(ids.len());
        for id in ids {
            if statuses.contains_key(&id) {
                continue;
            }
            let status = self.get_profile_status(&id).await;
            statuses.insert(id, status);
        }
        statuses
    }

    /// Release users; returns the ids no longer subscribed at all
    pub fn unsubscribe_from_users<I, S>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.unsubscribe(EntityKind::User, ids)
    }

    /// Release profiles; returns the ids no longer subscribed at all
    pub fn unsubscribe_from_profiles<I, S>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.unsubscribe(EntityKind::Profile, ids)
    }

    pub async fn get_user_status(&self, user_id: &str) -> PresenceStatus {
        self.status(EntityKind::User, user_id).await
    }

    pub async fn get_profile_status(&self, profile_id: &str) -> PresenceStatus {
        self.status(EntityKind::Profile, profile_id).await
    }

    /// Cache first; the network is only consulted on a miss while connected
    async fn status(&self, kind: EntityKind, id: &str) -> PresenceStatus {
        if let Some(status) = self.store.get(kind, id) {
            return status;
        }

        if !self.connection.is_connected() {
            tracing::trace!(kind = %kind, entity_id = %id, "Not connected, reading default");
            return PresenceStatus::Offline;
        }

        self.fallback.fetch_single(kind, id).await
    }

    /// Change the local status
    pub fn set_status(&self, status: PresenceStatus) {
        self.connection.set_status(status);
    }

    /// Stream of cache changes
    pub fn updates(&self) -> broadcast::Receiver<StatusChange> {
        self.store.subscribe()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn environment(&self) -> &EnvironmentMonitor {
        &self.environment
    }
}
