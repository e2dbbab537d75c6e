use anyhow::Context;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::models::{PipelineStatus, StartPipelineRequest, UploadTicket};
use crate::api::{DubbingApi, DubbingApiClient, ProgressCallback};
use crate::app_config::Config;
use crate::errors::{ApiFailure, AppError};
use crate::file_utils::{FileManager, MediaType};
use crate::language_utils;
use crate::polling::{PollObserver, PollOutcome, StatusPoller};

// @module: Application controller for the dubbing workflow

/// Per-run dubbing options; unset fields fall back to the configuration
#[derive(Debug, Clone, Default)]
pub struct DubRequest {
    pub target_language: Option<String>,
    pub source_language: Option<String>,
    pub voice_id: Option<String>,
}

/// Main application controller driving uploads and pipelines
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Remote dubbing API
    api: Arc<dyn DubbingApi>,
    // @field: Terminal progress display
    progress: MultiProgress,
}

/// Poll observer rendering pipeline updates on a spinner
struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    fn describe(status: &PipelineStatus) -> String {
        let mut message = status.status.to_string();
        if let Some(step) = &status.current_step {
            message.push_str(&format!(" ({})", step));
        }
        if let Some(progress) = status.progress {
            message.push_str(&format!(" {:.0}%", progress));
        }
        message
    }
}

impl PollObserver for SpinnerObserver {
    fn on_update(&mut self, status: &PipelineStatus) {
        debug!("Pipeline {} update: {}", status.pipeline_id, Self::describe(status));
        self.spinner.set_message(Self::describe(status));
    }

    fn on_complete(&mut self, status: &PipelineStatus) {
        self.spinner.finish_with_message(format!("✅ {}", Self::describe(status)));
    }

    fn on_error(&mut self, failure: &ApiFailure) {
        self.spinner.abandon_with_message(format!("❌ {}", failure.message));
    }
}

impl Controller {
    // @method: Create a new controller talking to the configured API
    pub fn with_config(config: Config) -> anyhow::Result<Self> {
        let api = DubbingApiClient::from_config(&config)
            .context("Failed to create dubbing API client")?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Create a controller on top of any API implementation
    pub fn with_api(config: Config, api: Arc<dyn DubbingApi>) -> Self {
        Self {
            config,
            api,
            progress: MultiProgress::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> Arc<dyn DubbingApi> {
        Arc::clone(&self.api)
    }

    /// Resolve the pipeline start request for an uploaded file
    pub fn build_start_request(&self, ticket: &UploadTicket, request: &DubRequest) -> Result<StartPipelineRequest, AppError> {
        let target = self.target_language(request)?;
        self.apply_options(StartPipelineRequest::from_ticket(ticket, target), request)
    }

    /// Resolve the pipeline start request when only the file key is known
    pub fn build_start_request_for_key(&self, file_key: &str, request: &DubRequest) -> Result<StartPipelineRequest, AppError> {
        let target = self.target_language(request)?;
        self.apply_options(StartPipelineRequest::new(file_key, target), request)
    }

    fn target_language(&self, request: &DubRequest) -> Result<String, AppError> {
        let target = request
            .target_language
            .as_deref()
            .unwrap_or(&self.config.dubbing.target_language);
        language_utils::normalize_to_part1_or_part2t(target).map_err(|e| AppError::Config(e.to_string()))
    }

    fn apply_options(&self, mut start: StartPipelineRequest, request: &DubRequest) -> Result<StartPipelineRequest, AppError> {
        if let Some(source) = request
            .source_language
            .as_deref()
            .or(self.config.dubbing.source_language.as_deref())
        {
            let source = language_utils::normalize_to_part1_or_part2t(source)
                .map_err(|e| AppError::Config(e.to_string()))?;
            start = start.source_language(source);
        }

        if let Some(voice) = request.voice_id.as_deref().or(self.config.dubbing.voice_id.as_deref()) {
            start = start.voice(voice);
        }

        Ok(start)
    }

    /// Run the whole workflow for one media file: prepare, upload, start, poll
    pub async fn run(&self, input_file: &Path, request: &DubRequest) -> Result<PipelineStatus, AppError> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }
        if FileManager::detect_media_type(input_file) == MediaType::Unknown {
            warn!("Unrecognized media type for {:?}, uploading anyway", input_file);
        }

        let prepare = FileManager::describe_upload(input_file)
            .map_err(|e| AppError::File(e.to_string()))?;
        info!(
            "Preparing upload of {} ({} bytes, {})",
            prepare.file_name, prepare.file_size, prepare.content_type
        );
        let ticket = self.api.prepare_upload(&prepare).await?;
        let start = self.build_start_request(&ticket, request)?;

        let payload = FileManager::read_payload(input_file)
            .await
            .map_err(|e| AppError::File(e.to_string()))?;
        self.upload_with_progress(&ticket.upload_url, payload).await?;

        if let Ok(name) = language_utils::get_language_name(&start.target_language) {
            info!("Starting dubbing pipeline into {}", name);
        }
        let initial = self.api.start_pipeline(&start).await?;
        info!("Pipeline {} started ({})", initial.pipeline_id, initial.status);

        let status = self.poll(&initial.pipeline_id).await?;

        info!(
            "Dubbing completed in {}.",
            Self::format_duration(start_time.elapsed())
        );
        if let Some(output) = &status.output_url {
            info!("Output: {}", output);
        }
        Ok(status)
    }

    /// Upload a payload, rendering a progress bar
    pub async fn upload_with_progress(&self, upload_url: &str, payload: bytes::Bytes) -> Result<(), ApiFailure> {
        let bar = self.progress.add(ProgressBar::new(100));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Uploading [{bar:40.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let callback_bar = bar.clone();
        let on_progress: ProgressCallback = Arc::new(move |percent: u8| callback_bar.set_position(u64::from(percent)));

        match self.api.upload_file(upload_url, payload, Some(on_progress)).await {
            Ok(()) => {
                bar.finish_with_message("uploaded");
                info!("Upload finished");
                Ok(())
            }
            Err(failure) => {
                bar.abandon();
                Err(failure)
            }
        }
    }

    /// Poll a pipeline until it is terminal, cancelling on Ctrl-C
    pub async fn poll(&self, pipeline_id: &str) -> Result<PipelineStatus, AppError> {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message("waiting for first status");

        let handle = StatusPoller::new(self.api(), self.config.polling.to_policy())
            .spawn(pipeline_id, SpinnerObserver { spinner: spinner.clone() });
        let cancel = handle.cancellation_token();
        let outcome = handle.join();
        tokio::pin!(outcome);

        let outcome = tokio::select! {
            outcome = &mut outcome => outcome,
            Ok(()) = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping status polling");
                cancel.cancel();
                outcome.await
            }
        };

        if matches!(outcome, PollOutcome::Cancelled) {
            spinner.abandon_with_message("cancelled");
        }
        Ok(outcome.into_result()?)
    }

    // @returns: Human readable duration
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
