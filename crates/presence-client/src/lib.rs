//! # presence-client
//!
//! Live presence tracking for users and profiles.
//!
//! A persistent channel pushes status changes into an in-memory
//! [`StatusStore`]; a REST fallback warms the store for newly subscribed
//! entities. Consumers read statuses from the store.

pub mod client;
pub mod connection;
pub mod environment;
pub mod error;
pub mod fallback;
pub mod store;
pub mod subscription;
pub mod transport;

pub use client::PresenceClient;
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState, HeartbeatScheduler};
pub use environment::{EnvironmentMonitor, HostSignal};
pub use error::{ClientError, FetchError, TransportError};
pub use fallback::{FallbackClient, FallbackConfig};
pub use store::{StatusChange, StatusStore};
pub use subscription::SubscriptionRegistry;
pub use transport::{ChannelLink, MemoryTransport, RemoteEnd, Transport, WebSocketTransport};
