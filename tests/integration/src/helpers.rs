//! Test helpers for integration tests
//!
//! Provides a mock presence backend serving the REST lookups and the
//! WebSocket channel, with knobs for latency and failures.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use presence_client::{ConnectionConfig, FallbackConfig, PresenceClient, WebSocketTransport};
use presence_core::{
    ApiResponse, BatchStatusData, BatchStatusRequest, ChannelMessage, PresenceStatus, StatusData,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Default)]
struct BackendInner {
    users: Mutex<HashMap<String, PresenceStatus>>,
    profiles: Mutex<HashMap<String, PresenceStatus>>,
    delay: Mutex<Duration>,
    fail_with: Mutex<Option<StatusCode>>,
    reject: AtomicBool,
    single_requests: AtomicUsize,
    batch_bodies: Mutex<Vec<BatchStatusRequest>>,
    authorization: Mutex<Vec<String>>,
    channel_tokens: Mutex<Vec<String>>,
    received: Mutex<Vec<ChannelMessage>>,
    pushes: Mutex<Option<broadcast::Sender<ChannelMessage>>>,
}

/// Shared state of the mock backend
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<BackendInner>,
}

impl MockBackend {
    /// Status returned by `GET /api/presence/status/{id}` and the batch endpoint
    pub fn set_user(&self, id: &str, status: PresenceStatus) {
        self.inner.users.lock().insert(id.to_string(), status);
    }

    /// Status returned by `GET /api/presence/profile/{id}`
    pub fn set_profile(&self, id: &str, status: PresenceStatus) {
        self.inner.profiles.lock().insert(id.to_string(), status);
    }

    /// Hold every REST answer for `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock() = delay;
    }

    /// Answer every REST call with a bare status code
    pub fn fail_with(&self, status: StatusCode) {
        *self.inner.fail_with.lock() = Some(status);
    }

    /// Answer every REST call with `success: false`
    pub fn reject(&self) {
        self.inner.reject.store(true, Ordering::SeqCst);
    }

    pub fn single_requests(&self) -> usize {
        self.inner.single_requests.load(Ordering::SeqCst)
    }

    pub fn batch_bodies(&self) -> Vec<BatchStatusRequest> {
        self.inner.batch_bodies.lock().clone()
    }

    /// Authorization headers seen on REST calls
    pub fn authorization(&self) -> Vec<String> {
        self.inner.authorization.lock().clone()
    }

    /// Tokens presented when opening the channel
    pub fn channel_tokens(&self) -> Vec<String> {
        self.inner.channel_tokens.lock().clone()
    }

    /// Events received on the channel with the given name
    pub fn events(&self, event: &str) -> Vec<ChannelMessage> {
        self.inner
            .received
            .lock()
            .iter()
            .filter(|m| m.event == event)
            .cloned()
            .collect()
    }

    /// Poll until at least `count` events named `event` arrived
    pub async fn wait_for_events(&self, event: &str, count: usize) -> Vec<ChannelMessage> {
        for _ in 0..100 {
            let found = self.events(event);
            if found.len() >= count {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.events(event)
    }

    /// Push an event to every open channel session
    pub fn push(&self, message: ChannelMessage) -> usize {
        self.pushes().send(message).unwrap_or(0)
    }

    fn pushes(&self) -> broadcast::Sender<ChannelMessage> {
        self.inner
            .pushes
            .lock()
            .get_or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        if let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            self.inner.authorization.lock().push(value.to_string());
        }
    }

    /// Wrap `data` in the envelope, honoring delay and failure knobs
    async fn reply<T: Serialize>(&self, data: T) -> Response {
        let delay = *self.inner.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fail_with = *self.inner.fail_with.lock();
        if let Some(status) = fail_with {
            return status.into_response();
        }

        if self.inner.reject.load(Ordering::SeqCst) {
            return Json(ApiResponse::<T>::failed()).into_response();
        }

        Json(ApiResponse::ok(data)).into_response()
    }

    async fn serve_socket(self, socket: WebSocket) {
        let (mut sink, mut stream) = socket.split();
        let mut pushes = self.pushes().subscribe();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(message) = ChannelMessage::from_json(&text) {
                            self.inner.received.lock().push(message);
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                push = pushes.recv() => {
                    let Ok(message) = push else { break };
                    let Ok(json) = message.to_json() else { continue };
                    if sink.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

async fn user_status(
    State(backend): State<MockBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    backend.record_auth(&headers);
    backend.inner.single_requests.fetch_add(1, Ordering::SeqCst);
    let status = backend.inner.users.lock().get(&id).copied().unwrap_or_default();
    backend.reply(StatusData { status }).await
}

async fn profile_status(
    State(backend): State<MockBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    backend.record_auth(&headers);
    backend.inner.single_requests.fetch_add(1, Ordering::SeqCst);
    let status = backend.inner.profiles.lock().get(&id).copied().unwrap_or_default();
    backend.reply(StatusData { status }).await
}

async fn batch_status(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(request): Json<BatchStatusRequest>,
) -> Response {
    backend.record_auth(&headers);
    let statuses = {
        let users = backend.inner.users.lock();
        request
            .user_ids
            .iter()
            .filter_map(|id| users.get(id).map(|status| (id.clone(), *status)))
            .collect()
    };
    backend.inner.batch_bodies.lock().push(request);
    backend.reply(BatchStatusData { statuses }).await
}

async fn channel(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = params.get("token").cloned().unwrap_or_default();
    backend.inner.channel_tokens.lock().push(token);
    ws.on_upgrade(move |socket| backend.serve_socket(socket))
}

/// Mock backend bound to an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: MockBackend,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new mock backend
    pub async fn start() -> Result<Self> {
        let backend = MockBackend::default();

        let app = Router::new()
            .route("/api/presence/status/:id", get(user_status))
            .route("/api/presence/profile/:id", get(profile_status))
            .route("/api/presence/batch", post(batch_status))
            .route("/presence", get(channel))
            .with_state(backend.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            backend,
            _handle: handle,
        })
    }

    /// Base URL for the REST endpoints
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the WebSocket channel
    pub fn channel_url(&self) -> String {
        format!("ws://{}/presence", self.addr)
    }

    /// A client pointed at this backend
    pub fn client(&self) -> Result<PresenceClient> {
        self.client_with_timeout(Duration::from_secs(3))
    }

    /// A client pointed at this backend with a custom request timeout
    pub fn client_with_timeout(&self, timeout: Duration) -> Result<PresenceClient> {
        Ok(PresenceClient::new(
            FallbackConfig::new(self.base_url()).with_timeout(timeout),
            ConnectionConfig::default(),
            Arc::new(WebSocketTransport::new(self.channel_url())),
        )?)
    }
}
