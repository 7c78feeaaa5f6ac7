//! In-process transport
//!
//! Every successful `open` queues a [`RemoteEnd`]: the server's side of the
//! link. Dropping the remote end disconnects the session.

use super::{ChannelLink, Transport, LINK_BUFFER_SIZE};
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use presence_core::{ChannelMessage, Credentials, PresenceEventType, PresenceUpdatePayload};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

#[derive(Default)]
struct MemoryInner {
    pending: Mutex<VecDeque<RemoteEnd>>,
    accepted: Notify,
    opens: AtomicUsize,
    fail_next: AtomicUsize,
    refuse_all: AtomicBool,
}

/// Transport whose peer lives in the same process
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` opens
    pub fn fail_next(&self, count: usize) {
        self.inner.fail_next.store(count, Ordering::SeqCst);
    }

    /// Fail every open until turned off
    pub fn refuse_all(&self, refuse: bool) {
        self.inner.refuse_all.store(refuse, Ordering::SeqCst);
    }

    /// Number of `open` calls so far, failed ones included
    pub fn open_count(&self) -> usize {
        self.inner.opens.load(Ordering::SeqCst)
    }

    /// Take the oldest unclaimed remote end, if any
    pub fn try_accept(&self) -> Option<RemoteEnd> {
        self.inner.pending.lock().pop_front()
    }

    /// Wait for the next session to be opened
    pub async fn accept(&self) -> RemoteEnd {
        loop {
            let notified = self.inner.accepted.notified();
            if let Some(remote) = self.try_accept() {
                return remote;
            }
            notified.await;
        }
    }

    fn should_fail(&self) -> bool {
        if self.inner.refuse_all.load(Ordering::SeqCst) {
            return true;
        }
        self.inner
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, credentials: &Credentials) -> Result<ChannelLink, TransportError> {
        self.inner.opens.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(TransportError::Refused);
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(LINK_BUFFER_SIZE);
        let (inbound_tx, inbound_rx) = mpsc::channel(LINK_BUFFER_SIZE);

        self.inner.pending.lock().push_back(RemoteEnd {
            credentials: credentials.clone(),
            outbound: outbound_rx,
            inbound: inbound_tx,
        });
        self.inner.accepted.notify_waiters();

        Ok(ChannelLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// The server's side of an in-memory link
#[derive(Debug)]
pub struct RemoteEnd {
    credentials: Credentials,
    outbound: mpsc::Receiver<ChannelMessage>,
    inbound: mpsc::Sender<ChannelMessage>,
}

impl RemoteEnd {
    /// Credentials the session was opened with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Wait for the next event sent by the client
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.outbound.recv().await
    }

    /// Take the next already-sent event
    pub fn try_recv(&mut self) -> Option<ChannelMessage> {
        self.outbound.try_recv().ok()
    }

    /// Take every already-sent event
    pub fn drain(&mut self) -> Vec<ChannelMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Take every already-sent event of one type
    pub fn drain_events(&mut self, event: PresenceEventType) -> Vec<ChannelMessage> {
        self.drain()
            .into_iter()
            .filter(|m| m.event_type() == Some(event))
            .collect()
    }

    /// Push an event to the client; false once the client side is gone
    pub async fn push(&self, message: ChannelMessage) -> bool {
        self.inbound.send(message).await.is_ok()
    }

    /// Push a `presence:update`
    pub async fn push_update(&self, payload: &PresenceUpdatePayload) -> bool {
        self.push(ChannelMessage::update(payload)).await
    }

    /// Check if the client dropped its side
    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }

    /// End the session from the server side
    pub fn disconnect(self) {}
}
