//! Host environment signals
//!
//! Maps network reachability and page visibility changes onto the
//! connection: coming back reconnects or re-announces `online`, going
//! hidden reports `away`, losing the network marks the channel down.

use crate::connection::ConnectionManager;
use presence_core::PresenceStatus;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSignal {
    /// Network became reachable
    Online,
    /// Network became unreachable
    Offline,
    /// The application came to the foreground
    Visible,
    /// The application went to the background
    Hidden,
}

impl HostSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for HostSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reacts to host signals on behalf of a connection
#[derive(Debug, Clone)]
pub struct EnvironmentMonitor {
    connection: ConnectionManager,
}

impl EnvironmentMonitor {
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Apply one signal
    pub async fn handle(&self, signal: HostSignal) {
        tracing::debug!(signal = %signal, state = %self.connection.state(), "Host signal");

        match signal {
            HostSignal::Online | HostSignal::Visible => self.resume().await,
            HostSignal::Offline => self.connection.mark_offline(),
            HostSignal::Hidden => {
                if self.connection.is_connected() {
                    self.connection.set_status(PresenceStatus::Away);
                }
            }
        }
    }

    /// Feed signals from `signals` until the sender is dropped
    pub fn spawn(self, mut signals: mpsc::Receiver<HostSignal>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                self.handle(signal).await;
            }
            tracing::debug!("Host signal source closed");
        })
    }

    async fn resume(&self) {
        if self.connection.is_connected() {
            self.connection.set_status(PresenceStatus::Online);
        } else if self.connection.has_credentials() {
            tracing::info!("Host back, reconnecting presence channel");
            self.connection.reconnect().await;
        }
    }
}
