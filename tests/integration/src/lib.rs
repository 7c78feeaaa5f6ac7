//! Integration test utilities for the presence client
//!
//! This crate provides a mock presence backend (REST endpoints plus the
//! WebSocket channel) for running end-to-end tests against the client.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;
