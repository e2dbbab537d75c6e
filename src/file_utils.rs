use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use std::fs;
use std::path::Path;

use crate::api::models::PrepareUploadRequest;

// @module: Local media file helpers

/// Kind of media a file holds, judged by its extension
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MediaType {
    /// Video container
    Video,
    /// Audio-only file
    Audio,
    /// Unknown file type
    Unknown,
}

/// Fallback MIME type for unrecognized files
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    /// Detect whether a file is video or audio from its extension
    pub fn detect_media_type<P: AsRef<Path>>(path: P) -> MediaType {
        let guess = mime_guess::from_path(path);
        if guess.iter().any(|mime| mime.type_() == mime_guess::mime::VIDEO) {
            MediaType::Video
        } else if guess.iter().any(|mime| mime.type_() == mime_guess::mime::AUDIO) {
            MediaType::Audio
        } else {
            MediaType::Unknown
        }
    }

    /// MIME type to announce for a file
    ///
    /// Some extensions map to several types; a video or audio guess wins over
    /// the others.
    pub fn content_type<P: AsRef<Path>>(path: P) -> String {
        let guess = mime_guess::from_path(path);
        guess
            .iter()
            .find(|mime| mime.type_() == mime_guess::mime::VIDEO || mime.type_() == mime_guess::mime::AUDIO)
            .unwrap_or_else(|| guess.first_or_octet_stream())
            .essence_str()
            .to_string()
    }

    /// Build the upload preparation request describing a local file
    pub fn describe_upload<P: AsRef<Path>>(path: P) -> Result<PrepareUploadRequest> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Path has no file name: {:?}", path))?;

        Ok(PrepareUploadRequest::new(
            file_name,
            metadata.len(),
            Self::content_type(path),
        ))
    }

    /// Read a whole file as an upload payload
    pub async fn read_payload<P: AsRef<Path>>(path: P) -> Result<Bytes> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(Bytes::from(data))
    }
}
