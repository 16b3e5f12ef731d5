//! VibeCheck Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and gateway
//! traits shared by every VibeCheck client component: the API client, the direct
//! uploader, the job status poller and the orchestration services.

pub mod config;
pub mod credential;
pub mod error;
#[cfg(feature = "fake")]
pub mod fake;
pub mod gateway;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{
    ConfirmationError, ErrorMetadata, GatewayError, LogLevel, PollTransportError,
    ResultFetchError, TicketRequestError,
};
pub use gateway::{InterviewerGateway, JobGateway, UploadGateway};
pub use models::{
    Analysis, Artifact, ArtifactSource, CreateInterviewer, DirectTicket, FormFieldTicket,
    Interviewer, InterviewerId, Job, JobId, JobListQuery, JobStatus, TicketRequest,
    TicketResponse, TransferShape, TransferTicket,
};
