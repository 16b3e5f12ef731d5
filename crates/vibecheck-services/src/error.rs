//! Consolidated errors for the upload and tracking flows.
//!
//! Each flow surfaces a single error that wraps the failing stage's own error.
//! [`ErrorMetadata`] delegates to the wrapped error, so callers can decide
//! between "retry the whole upload", "wait" and "this job produced no result".

use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;
use vibecheck_core::{
    ConfirmationError, ErrorMetadata, JobId, LogLevel, ResultFetchError, TicketRequestError,
};
use vibecheck_storage::TransferError;
use vibecheck_worker::PollError;

/// Upload stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Ticket,
    Transfer,
    Confirm,
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStage::Ticket => write!(f, "ticket"),
            UploadStage::Transfer => write!(f, "transfer"),
            UploadStage::Confirm => write!(f, "confirm"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Ticket(#[from] TicketRequestError),

    #[error("Upload for job {job_id} failed: {source}")]
    Transfer {
        job_id: JobId,
        #[source]
        source: TransferError,
    },

    #[error("Confirmation for job {job_id} failed: {source}")]
    Confirmation {
        job_id: JobId,
        #[source]
        source: ConfirmationError,
    },
}

impl UploadError {
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadError::Ticket(_) => UploadStage::Ticket,
            UploadError::Transfer { .. } => UploadStage::Transfer,
            UploadError::Confirmation { .. } => UploadStage::Confirm,
        }
    }

    /// The pre-allocated job, when the ticket stage got that far.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            UploadError::Ticket(_) => None,
            UploadError::Transfer { job_id, .. } | UploadError::Confirmation { job_id, .. } => {
                Some(*job_id)
            }
        }
    }

    fn inner(&self) -> &dyn ErrorMetadata {
        match self {
            UploadError::Ticket(e) => e,
            UploadError::Transfer { source, .. } => source,
            UploadError::Confirmation { source, .. } => source,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        self.inner().error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.inner().is_recoverable()
    }

    fn is_user_correctable(&self) -> bool {
        self.inner().is_user_correctable()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.inner().suggested_action()
    }

    fn client_message(&self) -> String {
        self.inner().client_message()
    }

    fn log_level(&self) -> LogLevel {
        self.inner().log_level()
    }
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Result(#[from] ResultFetchError),

    #[error("Tracking of job {job_id} was cancelled")]
    Cancelled { job_id: JobId },
}

impl ErrorMetadata for TrackError {
    fn error_code(&self) -> &'static str {
        match self {
            TrackError::Poll(e) => e.error_code(),
            TrackError::Result(e) => e.error_code(),
            TrackError::Cancelled { .. } => "TRACKING_CANCELLED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            TrackError::Poll(e) => e.is_recoverable(),
            TrackError::Result(e) => e.is_recoverable(),
            TrackError::Cancelled { .. } => true,
        }
    }

    fn is_user_correctable(&self) -> bool {
        match self {
            TrackError::Poll(e) => e.is_user_correctable(),
            TrackError::Result(e) => e.is_user_correctable(),
            TrackError::Cancelled { .. } => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            TrackError::Poll(e) => e.suggested_action(),
            TrackError::Result(e) => e.suggested_action(),
            TrackError::Cancelled { .. } => Some("Watch the job again to resume"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            TrackError::Poll(e) => e.client_message(),
            TrackError::Result(e) => e.client_message(),
            TrackError::Cancelled { .. } => "Stopped watching the job".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TrackError::Poll(e) => e.log_level(),
            TrackError::Result(e) => e.log_level(),
            TrackError::Cancelled { .. } => LogLevel::Debug,
        }
    }
}

/// Failure of the whole submit-and-track flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The upload succeeded; tracking can be resumed with `job_id`.
    #[error("Job {job_id} was submitted but could not be tracked: {source}")]
    Track {
        job_id: JobId,
        #[source]
        source: TrackError,
    },
}

impl FlowError {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            FlowError::Upload(e) => e.job_id(),
            FlowError::Track { job_id, .. } => Some(*job_id),
        }
    }

    fn inner(&self) -> &dyn ErrorMetadata {
        match self {
            FlowError::Upload(e) => e,
            FlowError::Track { source, .. } => source,
        }
    }
}

impl ErrorMetadata for FlowError {
    fn error_code(&self) -> &'static str {
        self.inner().error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.inner().is_recoverable()
    }

    fn is_user_correctable(&self) -> bool {
        self.inner().is_user_correctable()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.inner().suggested_action()
    }

    fn client_message(&self) -> String {
        self.inner().client_message()
    }

    fn log_level(&self) -> LogLevel {
        self.inner().log_level()
    }
}
