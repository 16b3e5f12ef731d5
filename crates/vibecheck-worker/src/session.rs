//! Session state, outcome and handle

use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vibecheck_core::{ErrorMetadata, GatewayError, Job, JobId, JobStatus, LogLevel};

/// Observable state of a polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Polling { attempts: u32 },
    Converged(JobStatus),
    Cancelled,
    Errored,
}

impl SessionState {
    /// Whether the session has stopped for good.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SessionState::Converged(_) | SessionState::Cancelled | SessionState::Errored
        )
    }
}

/// Why a session ended without converging.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Job {job_id} did not finish within {attempts} status checks")]
    AttemptsExhausted { job_id: JobId, attempts: u32 },

    #[error("Job {job_id} did not finish within {elapsed:?}")]
    DeadlineExceeded { job_id: JobId, elapsed: Duration },

    #[error("Status of job {job_id} cannot be read: {source}")]
    Rejected {
        job_id: JobId,
        #[source]
        source: GatewayError,
    },

    #[error("Polling session for job {job_id} aborted: {reason}")]
    Aborted { job_id: JobId, reason: String },
}

impl ErrorMetadata for PollError {
    fn error_code(&self) -> &'static str {
        match self {
            PollError::AttemptsExhausted { .. } => "POLL_ATTEMPTS_EXHAUSTED",
            PollError::DeadlineExceeded { .. } => "POLL_DEADLINE_EXCEEDED",
            PollError::Rejected { .. } => "JOB_STATUS_UNAVAILABLE",
            PollError::Aborted { .. } => "POLL_ABORTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // The job may still finish; a fresh session can pick it up
        !matches!(self, PollError::Rejected { .. })
    }

    fn is_user_correctable(&self) -> bool {
        match self {
            PollError::Rejected { source, .. } => source.is_user_correctable(),
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            PollError::Rejected { source, .. } => source.suggested_action(),
            _ => Some("Check the job again later"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            PollError::AttemptsExhausted { .. } | PollError::DeadlineExceeded { .. } => {
                "The analysis is taking longer than expected".to_string()
            }
            PollError::Rejected { source, .. } => source.client_message(),
            PollError::Aborted { .. } => "Tracking of this job stopped unexpectedly".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PollError::Aborted { .. } => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

/// The single outcome of a polling session.
#[derive(Debug)]
pub enum SessionEnd {
    /// The job reached `Completed` or `Failed`.
    Converged(Job),
    Cancelled,
    Errored(PollError),
}

impl SessionEnd {
    pub fn terminal_status(&self) -> Option<JobStatus> {
        match self {
            SessionEnd::Converged(job) => Some(job.status),
            _ => None,
        }
    }
}

/// Caller's side of a running session.
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct PollHandle {
    job_id: JobId,
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
    task: Option<JoinHandle<SessionEnd>>,
}

impl PollHandle {
    pub(crate) fn new(
        job_id: JobId,
        cancel: CancellationToken,
        state: watch::Receiver<SessionState>,
        task: JoinHandle<SessionEnd>,
    ) -> Self {
        Self {
            job_id,
            cancel,
            state,
            task: Some(task),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Stop the session. No fetch starts afterwards and a fetch in flight is
    /// discarded. Does nothing once the session has ended.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver for state changes, for observers that outlive the handle's owner.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait for the session's outcome.
    pub async fn wait(mut self) -> SessionEnd {
        let job_id = self.job_id;
        let Some(task) = self.task.take() else {
            return SessionEnd::Cancelled;
        };

        match task.await {
            Ok(end) => end,
            Err(e) if e.is_cancelled() => SessionEnd::Cancelled,
            Err(e) => SessionEnd::Errored(PollError::Aborted {
                job_id,
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
