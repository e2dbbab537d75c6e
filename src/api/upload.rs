use std::time::Duration;

use bytes::Bytes;
use futures::stream;
use log::{debug, error};
use reqwest::{Body, Client, header};

use crate::api::ProgressCallback;
use crate::errors::{ApiFailure, ErrorCode};

/// Size of the slices handed to the transport
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Tracks bytes handed to the transport and converts them to percentages
#[derive(Debug, Clone)]
pub struct UploadProgress {
    total: u64,
    loaded: u64,
    last_percent: Option<u8>,
}

impl UploadProgress {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            loaded: 0,
            last_percent: None,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Record `bytes` more transferred bytes
    ///
    /// Returns the new percentage when it changed. A zero total never
    /// reports, since no measurable progress exists.
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }

        self.loaded = self.loaded.saturating_add(bytes).min(self.total);
        let percent = (self.loaded.saturating_mul(100) / self.total) as u8;

        if self.last_percent.is_some_and(|last| last >= percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}

/// Split a payload into transport-sized slices without copying
fn chunk_payload(data: &Bytes) -> Vec<Bytes> {
    (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect()
}

/// PUT `data` to a pre-signed `upload_url`
///
/// The whole transfer races against `budget`; whichever finishes first wins
/// and the loser is dropped.
pub async fn put_bytes(
    client: &Client,
    upload_url: &str,
    data: Bytes,
    on_progress: Option<ProgressCallback>,
    budget: Duration,
) -> Result<(), ApiFailure> {
    let total = data.len() as u64;
    let mut progress = UploadProgress::new(total);

    let chunks = chunk_payload(&data).into_iter().map(move |chunk| {
        if let Some(percent) = progress.advance(chunk.len() as u64) {
            if let Some(callback) = &on_progress {
                callback(percent);
            }
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });

    debug!("Uploading {} bytes to pre-signed URL", total);

    let transfer = async {
        let response = client
            .put(upload_url)
            .header(header::CONTENT_LENGTH, total.to_string())
            .body(Body::wrap_stream(stream::iter(chunks)))
            .send()
            .await
            .map_err(|e| ApiFailure::from_upload_transport(&e, budget))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiFailure::new(
                ErrorCode::UploadFailed,
                format!("Upload failed with status {}", status.as_u16()),
            )
            .with_status(status.as_u16()));
        }
        Ok(())
    };

    let result = match tokio::time::timeout(budget, transfer).await {
        Ok(result) => result,
        Err(_) => Err(ApiFailure::upload_timeout(budget)),
    };

    if let Err(failure) = &result {
        error!("Upload failed: {}", failure);
    }
    result
}
