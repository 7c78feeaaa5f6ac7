//! Presence Integration Tests
//!
//! Runs the client against a mock backend on a local port, over real HTTP
//! and a real WebSocket.
//!
//! Run with: cargo test -p integration-tests --test presence_tests

use std::time::Duration;

use axum::http::StatusCode;
use integration_tests::{fixtures::*, TestServer};
use presence_client::ConnectionState;
use presence_common::PresenceConfig;
use presence_core::{ChannelMessage, EntityKind, PresenceStatus, PresenceUpdatePayload};
use serde_json::json;

// ============================================================================
// REST Fallback Tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_to_users_warms_store() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.backend.set_user("a", PresenceStatus::Busy);
    server.backend.set_user("b", PresenceStatus::Online);
    let client = server.client().unwrap();

    let statuses = client.subscribe_to_users(["a", "b"]).await;

    assert_eq!(statuses.len(), 2);
    assert_eq!(client.store().get(EntityKind::User, "a"), Some(PresenceStatus::Busy));
    assert_eq!(client.store().get(EntityKind::User, "b"), Some(PresenceStatus::Online));
    assert_eq!(client.store().len(EntityKind::User), 2);
}

#[tokio::test]
async fn test_batch_sends_entire_subscription_set() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.client().unwrap();

    client.subscribe_to_users(["b"]).await;
    client.subscribe_to_users(["a", "b"]).await;

    let bodies = server.backend.batch_bodies();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].user_ids, vec!["b"]);
    assert_eq!(bodies[1].user_ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.backend.set_user("a", PresenceStatus::Busy);
    server.backend.set_delay(Duration::from_millis(800));
    let client = server.client_with_timeout(Duration::from_millis(200)).unwrap();

    let started = tokio::time::Instant::now();
    let statuses = client.subscribe_to_users(["a"]).await;

    assert!(statuses.is_empty());
    assert!(started.elapsed() < Duration::from_millis(700));
    assert!(client.store().get(EntityKind::User, "a").is_none());
}

#[tokio::test]
async fn test_unsuccessful_batch_leaves_store_alone() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.backend.set_user("a", PresenceStatus::Busy);
    server.backend.reject();
    let client = server.client().unwrap();

    assert!(client.subscribe_to_users(["a"]).await.is_empty());
    assert!(client.store().is_empty(EntityKind::User));
}

// ============================================================================
// Read Path Tests
// ============================================================================

#[tokio::test]
async fn test_no_http_while_disconnected() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.backend.set_user("a", PresenceStatus::Busy);
    let client = server.client().unwrap();

    assert_eq!(client.get_user_status("a").await, PresenceStatus::Offline);
    assert_eq!(client.get_profile_status("p9").await, PresenceStatus::Offline);
    assert_eq!(server.backend.single_requests(), 0);
}

#[tokio::test]
async fn test_connected_miss_fetches_once() {
    let server = TestServer::start().await.expect("Failed to start server");
    let user_id = unique_user_id();
    server.backend.set_user(&user_id, PresenceStatus::Away);
    let client = server.client().unwrap();
    assert!(client.init(local_credentials()).await);

    assert_eq!(client.get_user_status(&user_id).await, PresenceStatus::Away);
    assert_eq!(client.get_user_status(&user_id).await, PresenceStatus::Away);

    assert_eq!(server.backend.single_requests(), 1);
    assert_eq!(server.backend.authorization(), vec!["Bearer t1"]);
}

#[tokio::test]
async fn test_http_error_reads_offline() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.backend.fail_with(StatusCode::INTERNAL_SERVER_ERROR);
    let client = server.client().unwrap();
    assert!(client.init(local_credentials()).await);

    let user_id = unique_user_id();
    assert_eq!(client.get_user_status(&user_id).await, PresenceStatus::Offline);
    assert!(client.store().get(EntityKind::User, &user_id).is_none());
}

#[tokio::test]
async fn test_profile_subscription_fetches_each_id() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (p1, p2) = (unique_profile_id(), unique_profile_id());
    server.backend.set_profile(&p1, PresenceStatus::Online);
    server.backend.set_profile(&p2, PresenceStatus::Busy);
    let client = server.client().unwrap();
    assert!(client.init(local_credentials()).await);

    let statuses = client.subscribe_to_profiles([p1.clone(), p2.clone()]).await;

    assert_eq!(statuses[&p1], PresenceStatus::Online);
    assert_eq!(statuses[&p2], PresenceStatus::Busy);
    assert_eq!(server.backend.single_requests(), 2);
    assert!(server.backend.batch_bodies().is_empty());
    assert_eq!(client.store().get(EntityKind::Profile, &p2), Some(PresenceStatus::Busy));
}

// ============================================================================
// Channel Tests
// ============================================================================

#[tokio::test]
async fn test_channel_handshake() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.client().unwrap();

    assert!(client.init(local_credentials()).await);
    assert_eq!(client.connection().state(), ConnectionState::Connected);

    let connects = server.backend.wait_for_events("presence:connect", 1).await;
    assert_eq!(
        connects[0].data,
        json!({"userId": "u1", "profileId": "p1", "deviceType": "desktop"})
    );

    let statuses = server.backend.wait_for_events("presence:status", 1).await;
    assert_eq!(statuses[0].data, json!({"status": "online"}));
    assert_eq!(server.backend.channel_tokens(), vec!["t1"]);
}

#[tokio::test]
async fn test_pushed_update_reaches_store() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.client().unwrap();
    let mut updates = client.updates();
    assert!(client.init(local_credentials()).await);
    server.backend.wait_for_events("presence:connect", 1).await;

    let user_id = unique_user_id();
    server.backend.push(ChannelMessage::update(&PresenceUpdatePayload::for_user(
        user_id.clone(),
        PresenceStatus::Busy,
    )));

    let change = tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("No update within 2s")
        .unwrap();
    assert_eq!(change.entity.id, user_id);
    assert_eq!(change.status, PresenceStatus::Busy);

    // Served from cache, no fallback call
    assert_eq!(client.get_user_status(&user_id).await, PresenceStatus::Busy);
    assert_eq!(server.backend.single_requests(), 0);
}

#[tokio::test]
async fn test_local_status_changes_are_sent() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = server.client().unwrap();
    assert!(client.init(local_credentials()).await);

    client.set_status(PresenceStatus::Busy);

    let statuses = server.backend.wait_for_events("presence:status", 2).await;
    assert_eq!(statuses[1].data, json!({"status": "busy"}));
}

#[tokio::test]
async fn test_init_against_missing_channel_fails_softly() {
    let client = presence_client::PresenceClient::from_config(
        &PresenceConfig::from_lookup(|key| match key {
            "PRESENCE_API_URL" => Some("http://127.0.0.1:9".to_string()),
            "PRESENCE_CHANNEL_URL" => Some("ws://127.0.0.1:9/presence".to_string()),
            _ => None,
        })
        .unwrap(),
    )
    .unwrap();

    assert!(!client.init(local_credentials()).await);
    assert_ne!(client.connection().state(), ConnectionState::Connected);
    assert_eq!(client.get_user_status("a").await, PresenceStatus::Offline);

    client.shutdown();
}
