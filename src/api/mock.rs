/*!
 * Scripted dubbing API for testing.
 *
 * `MockDubbingApi` answers status requests from a queue of scripted results
 * and records every call it receives, so poll loops and the dub workflow can
 * run without a network:
 * - `MockDubbingApi::new().with_statuses(...)` - answers in order
 * - `.repeating(...)` - answer used once the queue is empty
 * - `.with_status_delay(...)` - simulates a slow status endpoint
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Map;
use tokio::time::Instant;

use crate::api::models::{PipelineStatus, PrepareUploadRequest, StartPipelineRequest, UploadTicket};
use crate::api::upload::{UPLOAD_CHUNK_SIZE, UploadProgress};
use crate::api::{DubbingApi, ProgressCallback};
use crate::errors::{ApiFailure, ErrorCode};

type StatusResult = Result<PipelineStatus, ApiFailure>;

#[derive(Debug)]
struct MockState {
    statuses: VecDeque<StatusResult>,
    repeat: Option<StatusResult>,
    status_delay: Option<Duration>,
    ticket: Result<UploadTicket, ApiFailure>,
    start: StatusResult,
    upload: Result<(), ApiFailure>,
    status_calls: Vec<Instant>,
    prepare_requests: Vec<PrepareUploadRequest>,
    start_requests: Vec<StartPipelineRequest>,
    uploads: Vec<(String, usize)>,
}

/// Mock dubbing API answering from a script
#[derive(Debug, Clone)]
pub struct MockDubbingApi {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDubbingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDubbingApi {
    /// Create a mock whose prepare, upload and start calls succeed
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                statuses: VecDeque::new(),
                repeat: None,
                status_delay: None,
                ticket: Ok(UploadTicket {
                    upload_url: "mock://uploads/file".to_string(),
                    file_key: "mock-file-key".to_string(),
                    expires_in: Some(3600),
                    extra: Map::new(),
                }),
                start: Ok(PipelineStatus::new(Self::PIPELINE_ID, "pending")),
                upload: Ok(()),
                status_calls: Vec::new(),
                prepare_requests: Vec::new(),
                start_requests: Vec::new(),
                uploads: Vec::new(),
            })),
        }
    }

    /// Pipeline id returned by the default start answer
    pub const PIPELINE_ID: &'static str = "mock-pipeline";

    /// Queue status answers, served in order
    pub fn with_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = StatusResult>,
    {
        self.state.lock().statuses.extend(statuses);
        self
    }

    /// Answer used for every status call once the queue is empty
    pub fn repeating(self, status: StatusResult) -> Self {
        self.state.lock().repeat = Some(status);
        self
    }

    /// Delay every status answer
    pub fn with_status_delay(self, delay: Duration) -> Self {
        self.state.lock().status_delay = Some(delay);
        self
    }

    /// Set the prepare answer
    pub fn with_ticket(self, ticket: Result<UploadTicket, ApiFailure>) -> Self {
        self.state.lock().ticket = ticket;
        self
    }

    /// Set the start answer
    pub fn with_start(self, start: StatusResult) -> Self {
        self.state.lock().start = start;
        self
    }

    /// Set the upload answer
    pub fn with_upload_result(self, upload: Result<(), ApiFailure>) -> Self {
        self.state.lock().upload = upload;
        self
    }

    /// Number of status requests received
    pub fn status_call_count(&self) -> usize {
        self.state.lock().status_calls.len()
    }

    /// Instants at which status requests were received
    pub fn status_call_times(&self) -> Vec<Instant> {
        self.state.lock().status_calls.clone()
    }

    pub fn prepare_requests(&self) -> Vec<PrepareUploadRequest> {
        self.state.lock().prepare_requests.clone()
    }

    pub fn start_requests(&self) -> Vec<StartPipelineRequest> {
        self.state.lock().start_requests.clone()
    }

    /// Upload URL and payload size of every upload received
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.state.lock().uploads.clone()
    }
}

#[async_trait]
impl DubbingApi for MockDubbingApi {
    async fn prepare_upload(&self, request: &PrepareUploadRequest) -> Result<UploadTicket, ApiFailure> {
        let mut state = self.state.lock();
        state.prepare_requests.push(request.clone());
        state.ticket.clone()
    }

    async fn upload_file(
        &self,
        upload_url: &str,
        data: Bytes,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ApiFailure> {
        let result = {
            let mut state = self.state.lock();
            state.uploads.push((upload_url.to_string(), data.len()));
            state.upload.clone()
        };

        if result.is_ok() {
            let mut progress = UploadProgress::new(data.len() as u64);
            for chunk in data.chunks(UPLOAD_CHUNK_SIZE) {
                if let (Some(percent), Some(callback)) = (progress.advance(chunk.len() as u64), &on_progress) {
                    callback(percent);
                }
            }
        }
        result
    }

    async fn start_pipeline(&self, request: &StartPipelineRequest) -> Result<PipelineStatus, ApiFailure> {
        let mut state = self.state.lock();
        state.start_requests.push(request.clone());
        state.start.clone()
    }

    async fn get_pipeline_status(&self, _pipeline_id: &str) -> Result<PipelineStatus, ApiFailure> {
        let delay = self.state.lock().status_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.status_calls.push(Instant::now());
        match state.statuses.pop_front() {
            Some(answer) => answer,
            None => state.repeat.clone().unwrap_or_else(|| {
                Err(ApiFailure::new(
                    ErrorCode::NetworkError,
                    "No scripted status left",
                ))
            }),
        }
    }
}
