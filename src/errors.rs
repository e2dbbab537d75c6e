/*!
 * Error types for the unidub application.
 *
 * Every failure coming out of the dubbing API client is normalized into a
 * single [`ApiFailure`] value: a machine-readable [`ErrorCode`], a
 * human-readable message and, when the failure came from an HTTP response,
 * the status code. Application-level failures wrap it in [`AppError`].
 */

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Machine-readable failure codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request-level timeout elapsed before a response
    Timeout,
    /// Transport failed before a response was obtained
    NetworkError,
    /// Upload exceeded its transfer budget
    UploadTimeout,
    /// Upload transport failed
    UploadError,
    /// Upload completed with a non-success status
    UploadFailed,
    /// Non-success status without a usable error body
    UnknownError,
    /// Success status with a body that does not match the expected shape
    InvalidResponse,
    /// The remote pipeline reported a failure
    PipelineFailed,
    /// The poll loop ran past its total duration ceiling
    PollingTimeout,
    /// The poll loop hit its consecutive failure cap
    RetriesExhausted,
    /// The operation was cancelled by the caller
    Cancelled,
    /// Code declared by the remote API, passed through verbatim
    Remote(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UploadTimeout => "UPLOAD_TIMEOUT",
            Self::UploadError => "UPLOAD_ERROR",
            Self::UploadFailed => "UPLOAD_FAILED",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::PipelineFailed => "PIPELINE_FAILED",
            Self::PollingTimeout => "POLLING_TIMEOUT",
            Self::RetriesExhausted => "RETRIES_EXHAUSTED",
            Self::Cancelled => "CANCELLED",
            Self::Remote(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "TIMEOUT" => Self::Timeout,
            "NETWORK_ERROR" => Self::NetworkError,
            "UPLOAD_TIMEOUT" => Self::UploadTimeout,
            "UPLOAD_ERROR" => Self::UploadError,
            "UPLOAD_FAILED" => Self::UploadFailed,
            "UNKNOWN_ERROR" => Self::UnknownError,
            "INVALID_RESPONSE" => Self::InvalidResponse,
            "PIPELINE_FAILED" => Self::PipelineFailed,
            "POLLING_TIMEOUT" => Self::PollingTimeout,
            "RETRIES_EXHAUSTED" => Self::RetriesExhausted,
            "CANCELLED" => Self::Cancelled,
            other => Self::Remote(other.to_string()),
        }
    }
}

/// Normalized failure returned by every dubbing API operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ApiFailure {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
}

impl ApiFailure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    /// Attach the HTTP status the failure was derived from
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn timeout(budget: Duration) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Request timed out after {}s", budget.as_secs_f64()),
        )
    }

    pub fn upload_timeout(budget: Duration) -> Self {
        Self::new(
            ErrorCode::UploadTimeout,
            format!("Upload timed out after {}s", budget.as_secs_f64()),
        )
    }

    /// Normalize a transport error raised by an API request
    pub fn from_transport(error: &reqwest::Error, budget: Duration) -> Self {
        if error.is_timeout() {
            Self::timeout(budget)
        } else {
            Self::new(ErrorCode::NetworkError, format!("Network error: {}", error))
        }
    }

    /// Normalize a transport error raised by a direct upload
    pub fn from_upload_transport(error: &reqwest::Error, budget: Duration) -> Self {
        if error.is_timeout() {
            Self::upload_timeout(budget)
        } else {
            Self::new(ErrorCode::UploadError, format!("Upload error: {}", error))
        }
    }

    /// Whether the failure was produced by a timeout of any kind
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Timeout | ErrorCode::UploadTimeout | ErrorCode::PollingTimeout
        )
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the dubbing API client
    #[error("API error: {0}")]
    Api(#[from] ApiFailure),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
