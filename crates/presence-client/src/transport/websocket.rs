//! WebSocket transport
//!
//! Each `ChannelMessage` travels as one JSON text frame. The bearer token
//! is passed as the `token` query parameter.

use super::{ChannelLink, Transport, LINK_BUFFER_SIZE};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use presence_core::{ChannelMessage, Credentials};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Persistent channel over a WebSocket
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Channel URL with the token attached
    fn session_url(&self, credentials: &Credentials) -> Result<Url, TransportError> {
        let mut url =
            Url::parse(&self.url).map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", self.url)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(self.url.clone()));
        }
        url.query_pairs_mut().append_pair("token", &credentials.token);
        Ok(url)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, credentials: &Credentials) -> Result<ChannelLink, TransportError> {
        let url = self.session_url(credentials)?;

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::debug!(url = %self.url, "WebSocket opened");

        let (mut ws_sink, mut ws_stream) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ChannelMessage>(LINK_BUFFER_SIZE);
        let (inbound_tx, inbound_rx) = mpsc::channel::<ChannelMessage>(LINK_BUFFER_SIZE);

        // Writer: ends when the link's sender is dropped
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(event = %message.event, error = %e, "Failed to encode event");
                        continue;
                    }
                };
                if ws_sink.send(Message::Text(json)).await.is_err() {
                    tracing::debug!("WebSocket write failed");
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        // Reader: dropping `inbound_tx` on exit signals the disconnect
        tokio::spawn(async move {
            while let Some(frame) = ws_stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ChannelMessage::from_json(&text) {
                        Ok(message) => {
                            if inbound_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping undecodable frame");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::debug!("Server closed WebSocket");
                        break;
                    }
                    Ok(_) => {
                        // Ping/pong are answered by tungstenite; binary frames are not used
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        });

        Ok(ChannelLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
