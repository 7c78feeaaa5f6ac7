//! Connection Manager
//!
//! Drives `Disconnected -> Connecting -> Connected` over a [`Transport`].
//! On connect it announces the local identity and goes `online`. When the
//! channel drops it retries after a fixed delay, at most
//! `max_reconnect_attempts` times in a row; after that it waits for an
//! explicit `connect`/`reconnect` (the host coming back online or visible).

use super::{ConnectionState, HeartbeatScheduler, InboundDispatcher};
use crate::store::StatusStore;
use crate::transport::{ChannelLink, Transport};
use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use presence_common::PresenceConfig;
use presence_core::{ChannelMessage, ConnectPayload, Credentials, DeviceType, PresenceStatus};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Connection manager configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Period between heartbeats while connected
    pub heartbeat_interval: Duration,
    /// Fixed delay before an automatic reconnect
    pub reconnect_delay: Duration,
    /// Automatic reconnects allowed in a row
    pub max_reconnect_attempts: u32,
    /// Host signal for the device-type heuristic
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 2,
            user_agent: format!("presence-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&PresenceConfig> for ConnectionConfig {
    fn from(config: &PresenceConfig) -> Self {
        Self {
            heartbeat_interval: config.channel.heartbeat_interval(),
            reconnect_delay: config.channel.reconnect_delay(),
            max_reconnect_attempts: config.channel.max_reconnect_attempts,
            user_agent: config.app.user_agent.clone(),
        }
    }
}

/// One open channel session and the tasks serving it
struct Session {
    generation: u64,
    sender: mpsc::Sender<ChannelMessage>,
    reader: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: StatusStore,
    config: ConnectionConfig,
    device_type: DeviceType,
    state: watch::Sender<ConnectionState>,
    credentials: RwLock<Option<Credentials>>,
    local_status: RwLock<PresenceStatus>,
    /// Automatic reconnects since the last successful connect
    attempts: AtomicU32,
    /// Bumped by every connect and disconnect; stale sessions compare against it
    generation: AtomicU64,
    session: Mutex<Option<Session>>,
    retry: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the persistent presence channel
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a disconnected manager that routes pushed statuses into `store`
    pub fn new(transport: Arc<dyn Transport>, store: StatusStore, config: ConnectionConfig) -> Self {
        let device_type = DeviceType::from_user_agent(&config.user_agent);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                config,
                device_type,
                state,
                credentials: RwLock::new(None),
                local_status: RwLock::new(PresenceStatus::Offline),
                attempts: AtomicU32::new(0),
                generation: AtomicU64::new(0),
                session: Mutex::new(None),
                retry: Mutex::new(None),
            }),
        }
    }

    /// Store credentials and open the channel
    ///
    /// Resets the automatic retry budget. Returns whether the channel opened.
    pub async fn connect(&self, credentials: Credentials) -> bool {
        *self.inner.credentials.write() = Some(credentials);
        self.reconnect().await
    }

    /// Re-open the channel with the stored credentials
    ///
    /// Resets the automatic retry budget. Returns false without credentials.
    pub async fn reconnect(&self) -> bool {
        if self.inner.credentials.read().is_none() {
            tracing::debug!("No credentials, not connecting");
            return false;
        }

        self.inner.attempts.store(0, Ordering::SeqCst);
        self.inner.cancel_retry();
        self.inner.establish().await
    }

    /// Close the channel without scheduling a reconnect
    pub fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_retry();
        self.inner.close_session();
        self.inner.set_state(ConnectionState::Disconnected);

        tracing::info!("Presence channel closed");
    }

    /// Close the channel and forget the credentials
    pub fn shutdown(&self) {
        self.disconnect();
        *self.inner.credentials.write() = None;
    }

    /// Record that the host went offline
    ///
    /// Only the local belief changes; the channel is left as it is.
    pub fn mark_offline(&self) {
        if self.state() != ConnectionState::Disconnected {
            tracing::info!("Host offline, marking presence channel disconnected");
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }

    /// Change the local status, sending it if connected
    ///
    /// While not connected the value is only kept locally; it is not queued.
    pub fn set_status(&self, status: PresenceStatus) {
        self.inner.set_status(status);
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Observe state transitions
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Last status set locally
    pub fn local_status(&self) -> PresenceStatus {
        *self.inner.local_status.read()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.inner.credentials.read().clone()
    }

    pub fn has_credentials(&self) -> bool {
        self.inner.credentials.read().is_some()
    }

    /// Automatic reconnects used since the last successful connect
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub fn device_type(&self) -> DeviceType {
        self.inner.device_type
    }

    pub fn store(&self) -> &StatusStore {
        &self.inner.store
    }
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_status(&self, status: PresenceStatus) {
        *self.local_status.write() = status;

        if !self.is_connected() {
            tracing::debug!(status = %status, "Not connected, local status not sent");
        } else if self.send(ChannelMessage::status(status)) {
            tracing::debug!(status = %status, "Local status sent");
        } else {
            tracing::debug!(status = %status, "Local status not sent");
        }
    }

    /// Fire-and-forget send on the current session
    fn send(&self, message: ChannelMessage) -> bool {
        let sender = self.session.lock().as_ref().map(|s| s.sender.clone());
        let Some(sender) = sender else {
            return false;
        };

        match sender.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                let reason = match &e {
                    TrySendError::Full(_) => "buffer full",
                    TrySendError::Closed(_) => "channel closed",
                };
                tracing::warn!(event = %e.into_inner().event, reason, "Failed to send event");
                false
            }
        }
    }

    /// Open a new session, replacing any current one
    ///
    /// Boxed because a failed attempt schedules a task that calls back into it.
    fn establish(self: &Arc<Self>) -> BoxFuture<'static, bool> {
        let this = Arc::clone(self);

        async move {
            let credentials = this.credentials.read().clone();
            let Some(credentials) = credentials else {
                tracing::debug!("Credentials cleared, not connecting");
                return false;
            };

            this.close_session();
            let generation = this.generation.fetch_add(1, Ordering::SeqCst) + 1;
            this.set_state(ConnectionState::Connecting);

            tracing::debug!(
                user_id = %credentials.user_id,
                attempt = this.attempts.load(Ordering::SeqCst),
                "Opening presence channel"
            );

            match this.transport.open(&credentials).await {
                Ok(link) if this.is_current(generation) => {
                    this.on_open(generation, &credentials, link);
                    true
                }
                Ok(_) => {
                    tracing::debug!("Connect superseded while opening, dropping channel");
                    false
                }
                Err(e) => {
                    if !this.is_current(generation) {
                        return false;
                    }
                    tracing::warn!(error = %e, "Failed to open presence channel");
                    this.set_state(ConnectionState::Disconnected);
                    this.schedule_retry();
                    false
                }
            }
        }
        .boxed()
    }

    fn on_open(self: &Arc<Self>, generation: u64, credentials: &Credentials, link: ChannelLink) {
        let ChannelLink { outbound, inbound } = link;

        self.attempts.store(0, Ordering::SeqCst);

        let heartbeat = HeartbeatScheduler::new(
            outbound.clone(),
            self.state.subscribe(),
            self.config.heartbeat_interval,
        )
        .spawn();

        {
            // Held while spawning so the reader cannot observe a missing session.
            // Connected is published only once the session is in place.
            let mut slot = self.session.lock();
            let reader = tokio::spawn(Arc::clone(self).read_loop(generation, inbound));
            *slot = Some(Session {
                generation,
                sender: outbound,
                reader,
                heartbeat,
            });
            self.set_state(ConnectionState::Connected);
        }

        tracing::info!(
            user_id = %credentials.user_id,
            profile_id = %credentials.profile_id,
            device_type = %self.device_type,
            "Presence channel connected"
        );

        self.send(ChannelMessage::connect(&ConnectPayload {
            user_id: credentials.user_id.clone(),
            profile_id: credentials.profile_id.clone(),
            device_type: self.device_type,
        }));
        self.set_status(PresenceStatus::Online);
    }

    async fn read_loop(self: Arc<Self>, generation: u64, mut inbound: mpsc::Receiver<ChannelMessage>) {
        while let Some(message) = inbound.recv().await {
            tracing::trace!(event = %message.event, "Inbound event");
            InboundDispatcher::dispatch(&self.store, &message);
        }

        self.handle_disconnect(generation);
    }

    fn handle_disconnect(self: &Arc<Self>, generation: u64) {
        let session = {
            let mut slot = self.session.lock();
            match slot.as_ref() {
                Some(session) if session.generation == generation => slot.take(),
                _ => None,
            }
        };

        let Some(session) = session else {
            tracing::trace!(generation, "Superseded session ended");
            return;
        };

        // The reader is the task running this
        session.heartbeat.abort();
        self.set_state(ConnectionState::Disconnected);
        tracing::warn!("Presence channel disconnected");

        self.schedule_retry();
    }

    fn schedule_retry(self: &Arc<Self>) {
        let max_attempts = self.config.max_reconnect_attempts;
        let attempt = match self.attempts.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            (n < max_attempts).then_some(n + 1)
        }) {
            Ok(previous) => previous + 1,
            Err(_) => {
                tracing::warn!(
                    max_attempts,
                    "Reconnect attempts exhausted, waiting for the host to come back"
                );
                return;
            }
        };

        let delay = self.config.reconnect_delay;
        tracing::info!(attempt, max_attempts, delay = ?delay, "Scheduling reconnect");

        // Deadline fixed now so the delay counts from the disconnect
        let sleep = tokio::time::sleep(delay);
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            sleep.await;
            // Forget our own handle so a follow-up schedule does not abort us
            this.retry.lock().take();
            this.establish().await;
        });

        if let Some(previous) = self.retry.lock().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_retry(&self) {
        if let Some(handle) = self.retry.lock().take() {
            handle.abort();
        }
    }

    fn close_session(&self) {
        if let Some(session) = self.session.lock().take() {
            session.reader.abort();
            session.heartbeat.abort();
            // Dropping the sender closes the outbound side
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("local_status", &self.local_status())
            .field("attempts", &self.attempts())
            .field("device_type", &self.inner.device_type)
            .finish_non_exhaustive()
    }
}
