/*!
 * Dubbing API access.
 *
 * This module contains:
 * - `models`: wire payloads (upload ticket, pipeline status, requests)
 * - `client`: HTTP implementation with timeouts and error normalization
 * - `upload`: direct transfer to a pre-signed upload URL with progress
 * - `mock`: scripted in-process implementation for tests
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::ApiFailure;

pub mod client;
pub mod mock;
pub mod models;
pub mod upload;

pub use client::{ClientSettings, DubbingApiClient};
pub use models::{PipelineState, PipelineStatus, PrepareUploadRequest, StartPipelineRequest, UploadTicket};

/// Callback receiving upload progress as an integer percentage
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Common interface to the remote dubbing API
///
/// Implemented by the HTTP client and by the test mock, so the poller and the
/// controller can run against either.
#[async_trait]
pub trait DubbingApi: Send + Sync + Debug {
    /// Ask the remote for a pre-signed upload target
    async fn prepare_upload(&self, request: &PrepareUploadRequest) -> Result<UploadTicket, ApiFailure>;

    /// Transfer raw bytes to a pre-signed upload URL
    async fn upload_file(
        &self,
        upload_url: &str,
        data: Bytes,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ApiFailure>;

    /// Start a dubbing pipeline for an uploaded file
    async fn start_pipeline(&self, request: &StartPipelineRequest) -> Result<PipelineStatus, ApiFailure>;

    /// Fetch the current status of a pipeline
    async fn get_pipeline_status(&self, pipeline_id: &str) -> Result<PipelineStatus, ApiFailure>;
}
