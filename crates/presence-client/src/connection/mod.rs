//! Connection management
//!
//! Owns the persistent channel lifecycle, the heartbeat, and routing of
//! pushed events into the status cache.

mod dispatch;
mod heartbeat;
mod manager;
mod state;

pub use dispatch::InboundDispatcher;
pub use heartbeat::HeartbeatScheduler;
pub use manager::{ConnectionConfig, ConnectionManager};
pub use state::ConnectionState;
