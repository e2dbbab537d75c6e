/*!
 * API client integration tests against a local mock HTTP server
 */

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use unidub::api::{ClientSettings, DubbingApi, DubbingApiClient, PrepareUploadRequest, StartPipelineRequest};
use unidub::errors::ErrorCode;
use unidub::{PipelineState, PollPolicy};

use crate::common::{self, RecordingObserver};

fn client_for(server: &MockServer) -> DubbingApiClient {
    DubbingApiClient::new(server.base_url()).unwrap()
}

#[tokio::test]
async fn test_prepareUpload_withValidResponse_shouldReturnTicket() {
    common::init_logging();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/uniframe/dubbing/prepare")
                .header_exists("x-request-id")
                .json_body(json!({
                    "fileName": "movie.mp4",
                    "fileSize": 1024,
                    "contentType": "video/mp4",
                }));
            then.status(200).json_body(json!({
                "uploadUrl": "https://bucket.example.com/put?sig=1",
                "fileKey": "uploads/movie.mp4",
                "expiresIn": 900,
                "uploadId": "u-1",
            }));
        })
        .await;

    let ticket = client_for(&server)
        .prepare_upload(&PrepareUploadRequest::new("movie.mp4", 1024, "video/mp4"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(ticket.upload_url, "https://bucket.example.com/put?sig=1");
    assert_eq!(ticket.file_key, "uploads/movie.mp4");
    assert_eq!(ticket.expires_in, Some(900));
    assert_eq!(ticket.extra.get("uploadId"), Some(&json!("u-1")));
}

#[tokio::test]
async fn test_startPipeline_shouldSendOptionsAndReturnInitialStatus() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/uniframe/dubbing/start").json_body(json!({
                "fileKey": "uploads/movie.mp4",
                "targetLanguage": "es",
                "voiceId": "narrator",
            }));
            then.status(200).json_body(json!({
                "pipelineId": "p-77",
                "status": "pending",
            }));
        })
        .await;

    let request = StartPipelineRequest::new("uploads/movie.mp4", "es").voice("narrator");
    let status = client_for(&server).start_pipeline(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(status.pipeline_id, "p-77");
    assert_eq!(status.status, PipelineState::Pending);
}

#[tokio::test]
async fn test_getPipelineStatus_shouldReadAllFields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/p-77/status");
            then.status(200).json_body(json!({
                "pipelineId": "p-77",
                "status": "processing",
                "progress": 42.5,
                "currentStep": "voice synthesis",
            }));
        })
        .await;

    let status = client_for(&server).get_pipeline_status("p-77").await.unwrap();

    assert_eq!(status.status, PipelineState::Processing);
    assert_eq!(status.progress, Some(42.5));
    assert_eq!(status.current_step.as_deref(), Some("voice synthesis"));
    assert!(!status.has_failed());
}

#[tokio::test]
async fn test_errorBody_withCodeAndMessage_shouldPassThroughVerbatim() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/nope/status");
            then.status(404).json_body(json!({
                "code": "PIPELINE_NOT_FOUND",
                "message": "No pipeline with id nope",
            }));
        })
        .await;

    let failure = client_for(&server).get_pipeline_status("nope").await.unwrap_err();

    assert_eq!(failure.code, ErrorCode::Remote("PIPELINE_NOT_FOUND".to_string()));
    assert_eq!(failure.message, "No pipeline with id nope");
    assert_eq!(failure.status, Some(404));
}

#[tokio::test]
async fn test_errorBody_notJson_shouldFallBackToUnknownErrorWithStatus() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/uniframe/dubbing/start");
            then.status(500).body("<html>upstream exploded</html>");
        })
        .await;

    let failure = client_for(&server)
        .start_pipeline(&StartPipelineRequest::new("k", "es"))
        .await
        .unwrap_err();

    assert_eq!(failure.code, ErrorCode::UnknownError);
    assert_eq!(failure.message, "HTTP 500: Internal Server Error");
    assert_eq!(failure.status, Some(500));
}

#[tokio::test]
async fn test_errorBody_withOnlyMessage_shouldKeepMessageAndUseUnknownCode() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/uniframe/dubbing/prepare");
            then.status(503).json_body(json!({ "message": "Down for maintenance" }));
        })
        .await;

    let failure = client_for(&server)
        .prepare_upload(&PrepareUploadRequest::new("a.mp4", 1, "video/mp4"))
        .await
        .unwrap_err();

    assert_eq!(failure.code, ErrorCode::UnknownError);
    assert_eq!(failure.message, "Down for maintenance");
    assert_eq!(failure.status, Some(503));
}

#[tokio::test]
async fn test_errorBody_withMistypedCode_shouldStillKeepMessage() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/uniframe/dubbing/start");
            then.status(400).json_body(json!({ "code": 42, "message": "Video too long" }));
        })
        .await;

    let failure = client_for(&server)
        .start_pipeline(&StartPipelineRequest::new("k", "es"))
        .await
        .unwrap_err();

    assert_eq!(failure.code, ErrorCode::UnknownError);
    assert_eq!(failure.message, "Video too long");
    assert_eq!(failure.status, Some(400));
}

#[tokio::test]
async fn test_successBody_withWrongShape_shouldReportInvalidResponse() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/p-1/status");
            then.status(200).json_body(json!({ "unexpected": true }));
        })
        .await;

    let failure = client_for(&server).get_pipeline_status("p-1").await.unwrap_err();

    assert_eq!(failure.code, ErrorCode::InvalidResponse);
    assert_eq!(failure.status, Some(200));
}

#[tokio::test]
async fn test_slowResponse_pastRequestTimeout_shouldReportTimeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/slow/status");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({ "pipelineId": "slow", "status": "pending" }));
        })
        .await;

    let client = DubbingApiClient::with_settings(
        ClientSettings::new(server.base_url()).request_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let failure = client.get_pipeline_status("slow").await.unwrap_err();

    assert_eq!(failure.code, ErrorCode::Timeout);
    assert!(failure.is_timeout());
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn test_unreachableServer_shouldReportNetworkError() {
    let client = DubbingApiClient::new("http://127.0.0.1:1").unwrap();

    let failure = client.get_pipeline_status("p-1").await.unwrap_err();

    assert_eq!(failure.code, ErrorCode::NetworkError);
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn test_pipelineId_withReservedCharacters_shouldBeEncodedAsOneSegment() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/a%2Fb/status");
            then.status(200).json_body(json!({ "pipelineId": "a/b", "status": "pending" }));
        })
        .await;

    let status = client_for(&server).get_pipeline_status("a/b").await.unwrap();

    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(status.pipeline_id, "a/b");
}

#[tokio::test]
async fn test_pollPipelineStatus_withCompletedPipeline_shouldNotifyOnceAndStop() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/uniframe/dubbing/p-9/status");
            then.status(200).json_body(json!({
                "pipelineId": "p-9",
                "status": "completed",
                "outputUrl": "https://cdn.example.com/p-9.mp4",
            }));
        })
        .await;

    let policy = PollPolicy {
        interval: Duration::from_millis(20),
        backoff_cap: Duration::from_millis(100),
        ..PollPolicy::default()
    };
    let client = DubbingApiClient::with_settings(ClientSettings::new(server.base_url()).poll_policy(policy)).unwrap();
    let observer = RecordingObserver::new();

    let outcome = client.poll_pipeline_status("p-9", observer.clone()).join().await;

    let status = outcome.into_result().unwrap();
    assert_eq!(status.output_url.as_deref(), Some("https://cdn.example.com/p-9.mp4"));
    assert_eq!(observer.update_count(), 1);
    assert_eq!(observer.complete_count(), 1);
    assert_eq!(mock.hits_async().await, 1);
}
