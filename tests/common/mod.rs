/*!
 * Common test utilities for the unidub test suite
 */

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tempfile::TempDir;

use unidub::{ApiFailure, PipelineStatus, PollObserver};

/// Route library logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a fake video file of `size` bytes
pub fn create_test_video(dir: &Path, filename: &str, size: usize) -> Result<PathBuf> {
    let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    create_test_file(dir, filename, &content)
}

/// Everything a poll loop reported, in order
#[derive(Debug, Default)]
pub struct Recorded {
    pub updates: Vec<PipelineStatus>,
    pub completed: Vec<PipelineStatus>,
    pub errors: Vec<ApiFailure>,
}

/// Observer recording callbacks into shared state
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub recorded: Arc<Mutex<Recorded>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_count(&self) -> usize {
        self.recorded.lock().updates.len()
    }

    pub fn complete_count(&self) -> usize {
        self.recorded.lock().completed.len()
    }

    pub fn errors(&self) -> Vec<ApiFailure> {
        self.recorded.lock().errors.clone()
    }
}

impl PollObserver for RecordingObserver {
    fn on_update(&mut self, status: &PipelineStatus) {
        self.recorded.lock().updates.push(status.clone());
    }

    fn on_complete(&mut self, status: &PipelineStatus) {
        self.recorded.lock().completed.push(status.clone());
    }

    fn on_error(&mut self, failure: &ApiFailure) {
        self.recorded.lock().errors.push(failure.clone());
    }
}
