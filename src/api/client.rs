use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::api::models::{ErrorBody, PipelineStatus, PrepareUploadRequest, StartPipelineRequest, UploadTicket};
use crate::api::{DubbingApi, ProgressCallback, upload};
use crate::app_config::Config;
use crate::errors::{ApiFailure, ErrorCode};
use crate::polling::{PollHandle, PollObserver, PollPolicy, StatusPoller};

/// Path segments shared by every dubbing endpoint
const DUBBING_PATH: [&str; 3] = ["api", "uniframe", "dubbing"];

/// Header carrying the per-request correlation id
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Connection and timing settings for [`DubbingApiClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL of the dubbing API
    pub base_url: String,
    /// Budget for a whole API exchange (send and body read)
    pub request_timeout: Duration,
    /// Budget for a direct upload transfer
    pub upload_timeout: Duration,
    /// Budget for establishing a connection
    pub connect_timeout: Duration,
    /// Policy driving the status poller
    pub poll_policy: PollPolicy,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the upload timeout
    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Set the poll policy
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: crate::app_config::DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            upload_timeout: Duration::from_secs(config.api.upload_timeout_secs),
            connect_timeout: Duration::from_secs(config.api.connect_timeout_secs),
            poll_policy: config.polling.to_policy(),
        }
    }
}

/// HTTP client for the remote dubbing API
///
/// Cheap to clone: both inner HTTP clients share their connection pools.
#[derive(Debug, Clone)]
pub struct DubbingApiClient {
    /// HTTP client for API requests
    client: Client,
    /// HTTP client for direct uploads, kept apart from the API pipeline
    upload_client: Client,
    /// Base URL every endpoint is resolved against
    base_url: Url,
    settings: ClientSettings,
}

impl DubbingApiClient {
    /// Create a new client with default timeouts
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_settings(ClientSettings::new(base_url))
    }

    /// Create a new client from explicit settings
    pub fn with_settings(settings: ClientSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid API base URL: {}", settings.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot carry paths: {}", settings.base_url));
        }

        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to build API HTTP client")?;

        let upload_client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .context("Failed to build upload HTTP client")?;

        Ok(Self {
            client,
            upload_client,
            base_url,
            settings,
        })
    }

    /// Create a new client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_settings(ClientSettings::from(config))
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Resolve a dubbing endpoint, percent-encoding each segment
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected at construction
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(DUBBING_PATH).extend(segments);
        }
        url
    }

    /// Start polling a pipeline on the runtime until it reaches a terminal state
    ///
    /// The observer receives every update; the returned handle can cancel the
    /// loop or wait for its outcome.
    pub fn poll_pipeline_status<O>(&self, pipeline_id: impl Into<String>, observer: O) -> PollHandle
    where
        O: PollObserver + 'static,
    {
        StatusPoller::new(Arc::new(self.clone()), self.settings.poll_policy.clone())
            .spawn(pipeline_id, observer)
    }

    /// Run one API exchange under the request timeout
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T, ApiFailure> {
        let request_id = Uuid::new_v4().to_string();
        let budget = self.settings.request_timeout;
        debug!("{} [request {}]", operation, request_id);

        let exchange = async {
            let response = request
                .header(REQUEST_ID_HEADER, &request_id)
                .send()
                .await
                .map_err(|e| ApiFailure::from_transport(&e, budget))?;
            Self::read_json(response).await
        };

        let result = match tokio::time::timeout(budget, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ApiFailure::timeout(budget)),
        };

        if let Err(failure) = &result {
            debug!("{} failed [request {}]: {}", operation, request_id, failure);
        }
        result
    }

    /// Decode a response body, normalizing non-success statuses
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
        let status = response.status();
        let code = status.as_u16();
        let body = response.text().await.map_err(|e| {
            ApiFailure::new(
                ErrorCode::NetworkError,
                format!("Failed to read response body: {}", e),
            )
            .with_status(code)
        })?;

        if !status.is_success() {
            let fallback = format!(
                "HTTP {}: {}",
                code,
                status.canonical_reason().unwrap_or("Unknown Status")
            );
            let parsed = ErrorBody::parse(&body);
            return Err(ApiFailure::new(
                parsed.code.as_deref().map(ErrorCode::from).unwrap_or(ErrorCode::UnknownError),
                parsed.message.unwrap_or(fallback),
            )
            .with_status(code));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            ApiFailure::new(
                ErrorCode::InvalidResponse,
                format!("Failed to parse API response: {}", e),
            )
            .with_status(code)
        })
    }
}

#[async_trait]
impl DubbingApi for DubbingApiClient {
    async fn prepare_upload(&self, request: &PrepareUploadRequest) -> Result<UploadTicket, ApiFailure> {
        let url = self.endpoint(&["prepare"]);
        self.execute(self.client.post(url).json(request), "Prepare upload")
            .await
    }

    async fn upload_file(
        &self,
        upload_url: &str,
        data: Bytes,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ApiFailure> {
        upload::put_bytes(
            &self.upload_client,
            upload_url,
            data,
            on_progress,
            self.settings.upload_timeout,
        )
        .await
    }

    async fn start_pipeline(&self, request: &StartPipelineRequest) -> Result<PipelineStatus, ApiFailure> {
        let url = self.endpoint(&["start"]);
        self.execute(self.client.post(url).json(request), "Start pipeline")
            .await
    }

    async fn get_pipeline_status(&self, pipeline_id: &str) -> Result<PipelineStatus, ApiFailure> {
        let url = self.endpoint(&[pipeline_id, "status"]);
        self.execute(self.client.get(url), "Get pipeline status")
            .await
    }
}
