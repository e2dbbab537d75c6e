use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::DubbingApi;
use crate::api::models::PipelineStatus;
use crate::errors::{ApiFailure, ErrorCode};
use crate::polling::backoff::backoff_delay;

/// Timing and termination policy of the status poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between successful polls, also the backoff base
    pub interval: Duration,
    /// Upper bound of the wait after failed polls
    pub backoff_cap: Duration,
    /// Consecutive failures after which polling is abandoned
    pub max_consecutive_errors: u32,
    /// Total wall-clock time after which polling is abandoned
    pub max_duration: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            backoff_cap: Duration::from_secs(30),
            max_consecutive_errors: 10,
            max_duration: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl PollPolicy {
    /// Wait before the next poll given the current failure streak
    pub fn next_delay(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors == 0 {
            self.interval
        } else {
            backoff_delay(consecutive_errors, self.interval, self.backoff_cap)
        }
    }
}

/// Receives the results of a poll loop
pub trait PollObserver: Send {
    /// Every successfully fetched status, terminal or not
    fn on_update(&mut self, status: &PipelineStatus);

    /// The pipeline completed
    fn on_complete(&mut self, status: &PipelineStatus);

    /// The pipeline failed or polling was abandoned
    fn on_error(&mut self, failure: &ApiFailure);
}

/// Adapts three closures to [`PollObserver`]
pub struct PollCallbacks<U, C, E> {
    on_update: U,
    on_complete: C,
    on_error: E,
}

impl<U, C, E> PollCallbacks<U, C, E>
where
    U: FnMut(&PipelineStatus) + Send,
    C: FnMut(&PipelineStatus) + Send,
    E: FnMut(&ApiFailure) + Send,
{
    pub fn new(on_update: U, on_complete: C, on_error: E) -> Self {
        Self {
            on_update,
            on_complete,
            on_error,
        }
    }
}

impl<U, C, E> PollObserver for PollCallbacks<U, C, E>
where
    U: FnMut(&PipelineStatus) + Send,
    C: FnMut(&PipelineStatus) + Send,
    E: FnMut(&ApiFailure) + Send,
{
    fn on_update(&mut self, status: &PipelineStatus) {
        (self.on_update)(status)
    }

    fn on_complete(&mut self, status: &PipelineStatus) {
        (self.on_complete)(status)
    }

    fn on_error(&mut self, failure: &ApiFailure) {
        (self.on_error)(failure)
    }
}

/// Terminal result of a poll loop
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The pipeline reached `completed`
    Succeeded(PipelineStatus),
    /// The pipeline reported `failed` or an error message
    Failed {
        status: PipelineStatus,
        failure: ApiFailure,
    },
    /// The total duration ceiling was exceeded
    AbandonedTimeout(ApiFailure),
    /// Too many status requests failed in a row
    AbandonedErrors(ApiFailure),
    /// The loop was stopped through its cancellation token
    Cancelled,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// The failure reported to the observer, if any
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Failed { failure, .. } | Self::AbandonedTimeout(failure) | Self::AbandonedErrors(failure) => {
                Some(failure)
            }
            Self::Succeeded(_) | Self::Cancelled => None,
        }
    }

    pub fn into_result(self) -> Result<PipelineStatus, ApiFailure> {
        match self {
            Self::Succeeded(status) => Ok(status),
            Self::Failed { failure, .. } | Self::AbandonedTimeout(failure) | Self::AbandonedErrors(failure) => {
                Err(failure)
            }
            Self::Cancelled => Err(ApiFailure::new(ErrorCode::Cancelled, "Polling was cancelled")),
        }
    }
}

/// Handle to a poll loop running on the tokio runtime
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Stop the loop; no callback fires afterwards
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to reach a terminal state
    pub async fn join(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => PollOutcome::Cancelled,
        }
    }
}

/// Client-driven polling state machine for one pipeline
#[derive(Debug, Clone)]
pub struct StatusPoller {
    api: Arc<dyn DubbingApi>,
    policy: PollPolicy,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn DubbingApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run the loop on the runtime and return a handle to it
    pub fn spawn<O>(self, pipeline_id: impl Into<String>, mut observer: O) -> PollHandle
    where
        O: PollObserver + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let pipeline_id = pipeline_id.into();

        let task = tokio::spawn(async move { self.run(&pipeline_id, &mut observer, &token).await });

        PollHandle { cancel, task }
    }

    /// Poll `pipeline_id` until a terminal state, in place
    ///
    /// Each terminal state other than `Cancelled` is reported to the observer
    /// exactly once; nothing is requested after it.
    pub async fn run<O>(&self, pipeline_id: &str, observer: &mut O, cancel: &CancellationToken) -> PollOutcome
    where
        O: PollObserver + ?Sized,
    {
        let started = Instant::now();
        let mut consecutive_errors: u32 = 0;

        info!("Polling pipeline {}", pipeline_id);

        loop {
            let elapsed = started.elapsed();
            if elapsed > self.policy.max_duration {
                let failure = ApiFailure::new(
                    ErrorCode::PollingTimeout,
                    format!(
                        "Polling timed out after {}s without a final status",
                        self.policy.max_duration.as_secs()
                    ),
                );
                warn!("Pipeline {}: {}", pipeline_id, failure.message);
                observer.on_error(&failure);
                return PollOutcome::AbandonedTimeout(failure);
            }

            let fetched = tokio::select! {
                _ = cancel.cancelled() => return Self::cancelled(pipeline_id),
                fetched = self.api.get_pipeline_status(pipeline_id) => fetched,
            };

            match fetched {
                Ok(status) => {
                    consecutive_errors = 0;
                    debug!("Pipeline {} is {}", pipeline_id, status.status);
                    observer.on_update(&status);

                    if status.is_completed() {
                        info!("Pipeline {} completed", pipeline_id);
                        observer.on_complete(&status);
                        return PollOutcome::Succeeded(status);
                    }

                    if status.has_failed() {
                        let failure = ApiFailure::new(ErrorCode::PipelineFailed, status.failure_message());
                        warn!("Pipeline {} failed: {}", pipeline_id, failure.message);
                        observer.on_error(&failure);
                        return PollOutcome::Failed { status, failure };
                    }
                }
                Err(last) => {
                    consecutive_errors += 1;

                    if consecutive_errors >= self.policy.max_consecutive_errors {
                        let failure = ApiFailure::new(
                            ErrorCode::RetriesExhausted,
                            format!(
                                "Failed to get pipeline status after {} consecutive attempts: {}",
                                consecutive_errors, last
                            ),
                        );
                        warn!("Pipeline {}: {}", pipeline_id, failure.message);
                        observer.on_error(&failure);
                        return PollOutcome::AbandonedErrors(failure);
                    }

                    warn!(
                        "Status check {}/{} for pipeline {} failed: {} - retrying in {:?}",
                        consecutive_errors,
                        self.policy.max_consecutive_errors,
                        pipeline_id,
                        last,
                        self.policy.next_delay(consecutive_errors)
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Self::cancelled(pipeline_id),
                _ = tokio::time::sleep(self.policy.next_delay(consecutive_errors)) => {}
            }
        }
    }

    fn cancelled(pipeline_id: &str) -> PollOutcome {
        info!("Polling of pipeline {} cancelled", pipeline_id);
        PollOutcome::Cancelled
    }
}
