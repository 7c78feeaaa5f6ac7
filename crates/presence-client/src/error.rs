//! Client error types
//!
//! None of these reach read or subscribe callers; they are logged and the
//! caller receives a cached or default status instead.

use std::time::Duration;
use thiserror::Error;

/// Failure to open the persistent channel
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid channel URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to open channel: {0}")]
    Connect(String),

    #[error("Channel refused by peer")]
    Refused,
}

/// Failure of a REST fallback lookup
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Backend reported an unsuccessful response")]
    Rejected,

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Failure to construct a client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
