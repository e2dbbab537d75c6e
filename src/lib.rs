/*!
 * # unidub - command-line client for the UniFrame dubbing API
 *
 * A Rust library for sending videos to a remote dubbing service and
 * following the resulting pipeline until it finishes.
 *
 * ## Features
 *
 * - Prepare uploads and transfer media straight to pre-signed URLs with
 *   progress reporting
 * - Start dubbing pipelines with target language and voice options
 * - Poll pipeline status with linear, capped backoff on transient failures
 *   and a cancellable task handle
 * - Uniform timeouts and a single normalized error shape for every call
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `api`: Remote API access:
 *   - `api::client`: HTTP client with timeouts and error normalization
 *   - `api::upload`: Direct uploads with progress tracking
 *   - `api::models`: Wire payloads
 *   - `api::mock`: Scripted API for tests
 * - `polling`: Status polling state machine and backoff
 * - `app_controller`: End-to-end dubbing workflow
 * - `file_utils`: Local media file helpers
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod api;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod polling;

// Re-export main types for easier usage
pub use api::{DubbingApi, DubbingApiClient, PipelineState, PipelineStatus, UploadTicket};
pub use app_config::Config;
pub use app_controller::{Controller, DubRequest};
pub use errors::{ApiFailure, AppError, ErrorCode};
pub use polling::{PollCallbacks, PollHandle, PollObserver, PollOutcome, PollPolicy, StatusPoller};
