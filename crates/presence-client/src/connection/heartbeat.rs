//! Heartbeat Scheduler
//!
//! Sends `presence:heartbeat {}` once per interval while the connection is
//! `Connected`. Fire-and-forget: nothing is awaited and a dead channel is only
//! noticed through the transport's own disconnect signal.

use super::ConnectionState;
use presence_core::ChannelMessage;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Periodic keep-alive for one channel session
pub struct HeartbeatScheduler {
    sender: mpsc::Sender<ChannelMessage>,
    state: watch::Receiver<ConnectionState>,
    interval: Duration,
}

impl HeartbeatScheduler {
    #[must_use]
    pub fn new(
        sender: mpsc::Sender<ChannelMessage>,
        state: watch::Receiver<ConnectionState>,
        interval: Duration,
    ) -> Self {
        Self {
            sender,
            state,
            interval,
        }
    }

    /// Start beating; the first beat is one full interval from now
    ///
    /// The task ends when the session's sender closes; abort it to stop earlier.
    pub fn spawn(self) -> JoinHandle<()> {
        // Anchored at the spawn call, not at the task's first poll
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);

        tokio::spawn(async move {
            loop {
                ticker.tick().await;

                if *self.state.borrow() != ConnectionState::Connected {
                    tracing::trace!("Skipping heartbeat while not connected");
                    continue;
                }

                match self.sender.try_send(ChannelMessage::heartbeat()) {
                    Ok(()) => tracing::trace!("Heartbeat sent"),
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!("Outbound buffer full, heartbeat dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!("Channel closed, heartbeat stopped");
                        break;
                    }
                }
            }
        })
    }
}
