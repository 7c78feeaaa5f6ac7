//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use presence_core::Credentials;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Credentials of the local identity used across tests
pub fn local_credentials() -> Credentials {
    Credentials::new("t1", "u1", "p1")
}

/// A user id no other test uses
pub fn unique_user_id() -> String {
    format!("user-{}", unique_suffix())
}

/// A profile id no other test uses
pub fn unique_profile_id() -> String {
    format!("profile-{}", unique_suffix())
}
