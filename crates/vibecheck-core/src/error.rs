//! Error types module
//!
//! Each stage of the upload-and-track flow has its own error type so callers can
//! tell "retry the whole upload" apart from "wait" and from "the job produced no
//! result". Every user-facing error implements [`ErrorMetadata`], which describes
//! how the error should be presented and whether the user can fix it.
//!
//! A job reaching `Failed` is not an error: it is delivered as a normal terminal
//! outcome by the poller.

use std::time::Duration;

use crate::models::JobId;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a flaky network
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be presented to the person driving the client.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TICKET_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation later may succeed
    fn is_recoverable(&self) -> bool;

    /// Whether the user can fix the cause (bad input, unknown interviewer, duplicate)
    fn is_user_correctable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure talking to the orchestrating service.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        GatewayError::Transport {
            message: message.into(),
            source: source.into(),
        }
    }

    /// HTTP status code, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the same request may succeed if simply sent again later.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Transport { .. } | GatewayError::Timeout(_) => true,
            // A well-formed answer the client cannot read will not change on retry
            GatewayError::Decode(_) => false,
            GatewayError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            GatewayError::InvalidRequest(_) => false,
        }
    }
}

impl ErrorMetadata for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Transport { .. } => "SERVICE_UNREACHABLE",
            GatewayError::Timeout(_) => "SERVICE_TIMEOUT",
            GatewayError::Status { status: 401, .. } => "UNAUTHORIZED",
            GatewayError::Status { status: 403, .. } => "FORBIDDEN",
            GatewayError::Status { status: 404, .. } => "NOT_FOUND",
            GatewayError::Status { .. } => "SERVICE_ERROR",
            GatewayError::Decode(_) => "INVALID_RESPONSE",
            GatewayError::InvalidRequest(_) => "INVALID_INPUT",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn is_user_correctable(&self) -> bool {
        matches!(self, GatewayError::InvalidRequest(_))
            || matches!(self.status(), Some(400 | 401 | 403 | 404 | 409 | 422))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self.status() {
            Some(401) | Some(403) => Some("Check API token"),
            Some(404) => Some("Verify the resource ID exists"),
            _ if self.is_transient() => Some("Retry after a short delay"),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            GatewayError::Transport { .. } => "The service could not be reached".to_string(),
            GatewayError::Timeout(_) => "The service did not answer in time".to_string(),
            GatewayError::Status { detail, .. } => detail.clone(),
            GatewayError::Decode(_) => "The service sent an unexpected response".to_string(),
            GatewayError::InvalidRequest(msg) => msg.clone(),
        }
    }

    fn log_level(&self) -> LogLevel {
        if self.is_transient() {
            LogLevel::Warn
        } else {
            LogLevel::Debug
        }
    }
}

/// Failure obtaining a transfer ticket. The caller must not start a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TicketRequestError {
    #[error("Invalid ticket request: {0}")]
    Invalid(String),

    #[error("Ticket service unreachable: {0}")]
    Unreachable(#[source] GatewayError),

    #[error("Ticket request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Malformed ticket: {0}")]
    Malformed(String),
}

impl From<GatewayError> for TicketRequestError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Status { status, detail } => {
                TicketRequestError::Rejected { status, detail }
            }
            GatewayError::Decode(msg) => TicketRequestError::Malformed(msg),
            other => TicketRequestError::Unreachable(other),
        }
    }
}

impl From<validator::ValidationErrors> for TicketRequestError {
    fn from(err: validator::ValidationErrors) -> Self {
        TicketRequestError::Invalid(format!("Validation error: {}", err))
    }
}

impl ErrorMetadata for TicketRequestError {
    fn error_code(&self) -> &'static str {
        match self {
            TicketRequestError::Invalid(_) => "INVALID_ARTIFACT",
            TicketRequestError::Unreachable(_) => "TICKET_SERVICE_UNREACHABLE",
            TicketRequestError::Rejected { .. } => "TICKET_REJECTED",
            TicketRequestError::Malformed(_) => "MALFORMED_TICKET",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            TicketRequestError::Unreachable(_) | TicketRequestError::Malformed(_) => true,
            TicketRequestError::Rejected { status, .. } => *status >= 500 || *status == 429,
            TicketRequestError::Invalid(_) => false,
        }
    }

    fn is_user_correctable(&self) -> bool {
        match self {
            TicketRequestError::Invalid(_) => true,
            TicketRequestError::Rejected { status, .. } => {
                matches!(status, 400 | 409 | 413 | 415 | 422)
            }
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        if self.is_user_correctable() {
            Some("Check the file name and type, then upload again")
        } else if self.is_recoverable() {
            Some("Retry the upload later")
        } else {
            None
        }
    }

    fn client_message(&self) -> String {
        match self {
            TicketRequestError::Invalid(msg) => msg.clone(),
            TicketRequestError::Rejected { detail, .. } => detail.clone(),
            TicketRequestError::Unreachable(_) => {
                "Could not reach the upload service".to_string()
            }
            TicketRequestError::Malformed(_) => {
                "The upload service sent an unusable ticket".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        if self.is_user_correctable() {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }
}

/// Failure confirming a completed transfer.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Interviewer not found: {detail}")]
    InterviewerNotFound { detail: String },

    #[error("Transfer not recognized as complete: {detail}")]
    TransferIncomplete { detail: String },

    #[error("Confirmation failed: {0}")]
    Failed(#[source] GatewayError),
}

impl From<GatewayError> for ConfirmationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Status {
                status: 404,
                detail,
            } => ConfirmationError::InterviewerNotFound { detail },
            GatewayError::Status {
                status: 409,
                detail,
            } => ConfirmationError::TransferIncomplete { detail },
            other => ConfirmationError::Failed(other),
        }
    }
}

impl ErrorMetadata for ConfirmationError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfirmationError::InterviewerNotFound { .. } => "INTERVIEWER_NOT_FOUND",
            ConfirmationError::TransferIncomplete { .. } => "TRANSFER_INCOMPLETE",
            ConfirmationError::Failed(_) => "CONFIRMATION_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ConfirmationError::Failed(inner) => inner.is_transient(),
            _ => false,
        }
    }

    fn is_user_correctable(&self) -> bool {
        !matches!(self, ConfirmationError::Failed(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ConfirmationError::InterviewerNotFound { .. } => {
                Some("Select an existing interviewer or create one first")
            }
            ConfirmationError::TransferIncomplete { .. } => {
                Some("Upload the recording again")
            }
            ConfirmationError::Failed(_) => Some("Retry the upload later"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ConfirmationError::InterviewerNotFound { .. } => {
                "The selected interviewer does not exist".to_string()
            }
            ConfirmationError::TransferIncomplete { .. } => {
                "The service has not received the recording".to_string()
            }
            ConfirmationError::Failed(inner) => inner.client_message(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ConfirmationError::Failed(_) => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

/// A single status fetch failed. Transient: the session keeps polling.
#[derive(Debug, thiserror::Error)]
#[error("Status fetch #{attempt} for job {job_id} failed: {source}")]
pub struct PollTransportError {
    pub job_id: JobId,
    pub attempt: u32,
    #[source]
    pub source: GatewayError,
}

/// Failure retrieving the analysis of a completed job. Reported, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ResultFetchError {
    #[error("Job {job_id} is completed but has no analysis")]
    MissingAnalysis { job_id: JobId },

    #[error("Job {job_id} is not completed: {detail}")]
    NotCompleted { job_id: JobId, detail: String },

    #[error("Analysis for job {job_id} is invalid: {reason}")]
    Invalid { job_id: JobId, reason: String },

    #[error("Analysis fetch failed: {0}")]
    Gateway(#[source] GatewayError),
}

impl ErrorMetadata for ResultFetchError {
    fn error_code(&self) -> &'static str {
        match self {
            ResultFetchError::MissingAnalysis { .. } => "ANALYSIS_MISSING",
            ResultFetchError::NotCompleted { .. } => "JOB_NOT_COMPLETED",
            ResultFetchError::Invalid { .. } => "ANALYSIS_INVALID",
            ResultFetchError::Gateway(_) => "ANALYSIS_FETCH_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ResultFetchError::Gateway(inner) => inner.is_transient(),
            _ => false,
        }
    }

    fn is_user_correctable(&self) -> bool {
        false
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ResultFetchError::Gateway(inner) if inner.is_transient() => {
                Some("Open the job again later")
            }
            _ => Some("Contact support if this error persists"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ResultFetchError::MissingAnalysis { .. } | ResultFetchError::Invalid { .. } => {
                "The analysis for this interview is unavailable".to_string()
            }
            ResultFetchError::NotCompleted { .. } => {
                "The analysis for this interview is not ready".to_string()
            }
            ResultFetchError::Gateway(inner) => inner.client_message(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ResultFetchError::Gateway(inner) if inner.is_transient() => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
