//! Gateway traits for the orchestrating service
//!
//! The API client implements these against HTTP; tests implement them with the
//! scripted fakes in [`crate::fake`]. Every method takes an explicit credential.

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::{ConfirmationError, GatewayError, TicketRequestError};
use crate::models::{
    Analysis, CreateInterviewer, Interviewer, InterviewerId, Job, JobId, JobListQuery,
    TicketRequest, TransferTicket,
};

/// Ticket issuance and upload confirmation.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Request a single-use transfer ticket. The service pre-allocates a pending job.
    async fn request_ticket(
        &self,
        credential: &Credential,
        request: &TicketRequest,
    ) -> Result<TransferTicket, TicketRequestError>;

    /// Tell the service the transfer finished. Starts processing for the job.
    async fn confirm_upload(
        &self,
        credential: &Credential,
        job_id: JobId,
        interviewer_id: InterviewerId,
    ) -> Result<(), ConfirmationError>;
}

/// Read access to jobs and their analyses.
#[async_trait]
pub trait JobGateway: Send + Sync {
    async fn job_status(&self, credential: &Credential, job_id: JobId) -> Result<Job, GatewayError>;

    async fn list_jobs(
        &self,
        credential: &Credential,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, GatewayError>;

    /// `Ok(None)` when the service has no analysis for the job.
    async fn fetch_analysis(
        &self,
        credential: &Credential,
        job_id: JobId,
    ) -> Result<Option<Analysis>, GatewayError>;
}

#[async_trait]
pub trait InterviewerGateway: Send + Sync {
    async fn list_interviewers(&self, credential: &Credential)
        -> Result<Vec<Interviewer>, GatewayError>;

    async fn create_interviewer(
        &self,
        credential: &Credential,
        request: &CreateInterviewer,
    ) -> Result<Interviewer, GatewayError>;

    async fn get_interviewer(
        &self,
        credential: &Credential,
        interviewer_id: InterviewerId,
    ) -> Result<Option<Interviewer>, GatewayError>;
}
