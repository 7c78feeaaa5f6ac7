//! REST Fallback Client
//!
//! Bounded-timeout lookups against the presence query endpoints. Successful
//! answers are written into the [`StatusStore`]; failures leave the store
//! untouched and are collapsed to `offline` (single) or an empty map (batch).

use crate::error::FetchError;
use crate::store::StatusStore;
use parking_lot::RwLock;
use presence_common::ApiConfig;
use presence_core::{
    ApiResponse, BatchStatusData, BatchStatusRequest, EntityKind, PresenceStatus, StatusData,
};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Fallback client configuration
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Base URL of the backend (no trailing slash needed)
    pub base_url: String,
    /// Whole-exchange timeout for each request
    pub request_timeout: Duration,
}

impl FallbackConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl From<&ApiConfig> for FallbackConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// REST lookups that populate the status cache
#[derive(Clone)]
pub struct FallbackClient {
    http: reqwest::Client,
    config: FallbackConfig,
    store: StatusStore,
    token: Arc<RwLock<Option<String>>>,
}

impl FallbackClient {
    /// Create a fallback client writing into `store`
    pub fn new(config: FallbackConfig, store: StatusStore) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(http, config, store))
    }

    /// Create a fallback client from an existing HTTP client
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: FallbackConfig, store: StatusStore) -> Self {
        Self {
            http,
            config,
            store,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Set (or clear) the bearer token sent with every request
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Look up one entity; `offline` on any failure
    pub async fn fetch_single(&self, kind: EntityKind, id: &str) -> PresenceStatus {
        match self.try_fetch_single(kind, id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    entity_id = %id,
                    error = %e,
                    "Presence lookup failed, defaulting to offline"
                );
                PresenceStatus::Offline
            }
        }
    }

    /// Look up one entity, storing and returning its status
    pub async fn try_fetch_single(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<PresenceStatus, FetchError> {
        let resource = match kind {
            EntityKind::User => "status",
            EntityKind::Profile => "profile",
        };
        let url = self.endpoint(&["api", "presence", resource, id])?;

        let response: ApiResponse<StatusData> = self.execute(self.http.get(url)).await?;
        let status = response.into_data().ok_or(FetchError::Rejected)?.status;

        self.store.set(kind, id, status);
        Ok(status)
    }

    /// Look up many users at once; empty map on any failure
    pub async fn fetch_batch(&self, user_ids: &[String]) -> HashMap<String, PresenceStatus> {
        match self.try_fetch_batch(user_ids).await {
            Ok(statuses) => statuses,
            Err(e) => {
                tracing::warn!(
                    count = user_ids.len(),
                    error = %e,
                    "Batch presence lookup failed"
                );
                HashMap::new()
            }
        }
    }

    /// Look up many users at once, merging every returned status into the store
    pub async fn try_fetch_batch(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, PresenceStatus>, FetchError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.endpoint(&["api", "presence", "batch"])?;
        let body = BatchStatusRequest {
            user_ids: user_ids.to_vec(),
        };

        let response: ApiResponse<BatchStatusData> =
            self.execute(self.http.post(url).json(&body)).await?;
        let statuses = response.into_data().ok_or(FetchError::Rejected)?.statuses;

        let written = self.store.merge(
            EntityKind::User,
            statuses.iter().map(|(id, status)| (id.clone(), *status)),
        );
        tracing::debug!(requested = user_ids.len(), written, "Batch presence merged");

        Ok(statuses)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.config.base_url)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| FetchError::InvalidUrl(self.config.base_url.clone()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request and decode its envelope, all within the timeout
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let token = self.token.read().clone();
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            Ok::<T, FetchError>(serde_json::from_slice(&body)?)
        };

        tokio::time::timeout(self.config.request_timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.config.request_timeout))?
    }
}

impl std::fmt::Debug for FallbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackClient")
            .field("base_url", &self.config.base_url)
            .field("request_timeout", &self.config.request_timeout)
            .finish_non_exhaustive()
    }
}
