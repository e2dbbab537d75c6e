/*!
 * Wire models for the dubbing API.
 *
 * All payloads use camelCase field names on the wire.
 */

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request describing a file about to be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareUploadRequest {
    /// File name as shown to the remote system
    pub file_name: String,
    /// Size of the payload in bytes
    pub file_size: u64,
    /// MIME type of the payload
    pub content_type: String,
}

impl PrepareUploadRequest {
    pub fn new(file_name: impl Into<String>, file_size: u64, content_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            content_type: content_type.into(),
        }
    }
}

/// Pre-signed upload target returned by the prepare call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Pre-signed destination for the PUT transfer
    pub upload_url: String,

    /// Identifier to echo back when starting the pipeline
    pub file_key: String,

    /// Seconds until the upload URL expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Any further identifiers the remote asked to have echoed back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request starting a dubbing pipeline for an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineRequest {
    /// File key from the upload ticket
    pub file_key: String,

    /// Language to dub into
    pub target_language: String,

    /// Language spoken in the source, detected remotely when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,

    /// Voice selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Ticket identifiers and additional dubbing options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl StartPipelineRequest {
    /// Create a new start request
    pub fn new(file_key: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            file_key: file_key.into(),
            target_language: target_language.into(),
            source_language: None,
            voice_id: None,
            options: Map::new(),
        }
    }

    /// Create a start request echoing every identifier of an upload ticket
    pub fn from_ticket(ticket: &UploadTicket, target_language: impl Into<String>) -> Self {
        let mut request = Self::new(ticket.file_key.clone(), target_language);
        request.options = ticket.extra.clone();
        request
    }

    /// Set the source language
    pub fn source_language(mut self, language: impl Into<String>) -> Self {
        self.source_language = Some(language.into());
        self
    }

    /// Set the voice
    pub fn voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Add an arbitrary option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Lifecycle state of a remote pipeline
///
/// Labels other than the four known ones are kept verbatim and treated as
/// in-progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipelineState {
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl PipelineState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(label) => label,
        }
    }

    /// Whether no further state changes are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for PipelineState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for PipelineState {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<PipelineState> for String {
    fn from(state: PipelineState) -> Self {
        match state {
            PipelineState::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record of a remote pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    /// Opaque identifier assigned by the remote system
    pub pipeline_id: String,

    /// Current lifecycle state
    pub status: PipelineState,

    /// Failure description, present when the pipeline failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Completion percentage reported by the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    /// Name of the step currently running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,

    /// Location of the dubbed output once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
}

impl PipelineStatus {
    pub fn new(pipeline_id: impl Into<String>, status: impl Into<PipelineState>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            status: status.into(),
            error_message: None,
            progress: None,
            current_step: None,
            output_url: None,
        }
    }

    /// Set the error message
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set the progress percentage
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the current step
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == PipelineState::Completed
    }

    /// A pipeline counts as failed when it says so or carries an error message
    pub fn has_failed(&self) -> bool {
        self.status == PipelineState::Failed
            || self.error_message.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// Failure message to report, with a default when the remote gave none
    pub fn failure_message(&self) -> String {
        match self.error_message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => "Pipeline failed".to_string(),
        }
    }
}

/// Error body returned with non-success responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Read `code` and `message` from a response body
    ///
    /// Each field is taken only when it is a string; a missing or mistyped
    /// field leaves the other one intact.
    pub fn parse(body: &str) -> Self {
        let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            code: field("code"),
            message: field("message"),
        }
    }
}
