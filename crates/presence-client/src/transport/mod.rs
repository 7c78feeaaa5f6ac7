//! Transport seam for the persistent channel
//!
//! A transport opens a [`ChannelLink`]: a pair of typed channels carrying
//! named events. The inbound receiver closing is the disconnect signal.

mod memory;
mod websocket;

pub use memory::{MemoryTransport, RemoteEnd};
pub use websocket::WebSocketTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use presence_core::{ChannelMessage, Credentials};
use tokio::sync::mpsc;

/// Buffer size for each direction of a link
pub const LINK_BUFFER_SIZE: usize = 64;

/// An open channel session
#[derive(Debug)]
pub struct ChannelLink {
    /// Events sent to the server
    pub outbound: mpsc::Sender<ChannelMessage>,
    /// Events pushed by the server; closes when the session ends
    pub inbound: mpsc::Receiver<ChannelMessage>,
}

/// Opens channel sessions for given credentials
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new session
    async fn open(&self, credentials: &Credentials) -> Result<ChannelLink, TransportError>;
}
