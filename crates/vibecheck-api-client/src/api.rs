//! Domain methods for the API client.
//!
//! The gateway traits from `vibecheck_core` are implemented here. Wrapper types
//! for the list endpoints accept both a bare array and a paginated envelope.

use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use crate::ApiClient;
use vibecheck_core::models::TicketResponse;
use vibecheck_core::{
    Analysis, ConfirmationError, CreateInterviewer, Credential, GatewayError, Interviewer,
    InterviewerGateway, InterviewerId, Job, JobGateway, JobId, JobListQuery, TicketRequest,
    TicketRequestError, TransferTicket, UploadGateway,
};

/// `GET /jobs` response: a bare array or `{items, total, limit, offset}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JobListResponse {
    Plain(Vec<Job>),
    Paginated { items: Vec<Job> },
}

impl JobListResponse {
    pub fn into_items(self) -> Vec<Job> {
        match self {
            JobListResponse::Plain(items) => items,
            JobListResponse::Paginated { items, .. } => items,
        }
    }
}

/// `GET /interviewers` response: a bare array or `{items, ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InterviewerListResponse {
    Plain(Vec<Interviewer>),
    Paginated { items: Vec<Interviewer> },
}

impl InterviewerListResponse {
    pub fn into_items(self) -> Vec<Interviewer> {
        match self {
            InterviewerListResponse::Plain(items) => items,
            InterviewerListResponse::Paginated { items } => items,
        }
    }
}

#[async_trait]
impl UploadGateway for ApiClient {
    #[tracing::instrument(
        skip(self, credential, request),
        fields(filename = %request.filename, content_type = %request.content_type)
    )]
    async fn request_ticket(
        &self,
        credential: &Credential,
        request: &TicketRequest,
    ) -> Result<TransferTicket, TicketRequestError> {
        request.validate()?;

        let response: TicketResponse = self
            .post_json(credential, "/uploads/ticket", request)
            .await?;
        let ticket = TransferTicket::try_from(response)?;

        tracing::info!(
            job_id = %ticket.job_id(),
            shape = %ticket.shape(),
            "Transfer ticket issued"
        );
        Ok(ticket)
    }

    #[tracing::instrument(skip(self, credential), fields(job_id = %job_id, interviewer_id = %interviewer_id))]
    async fn confirm_upload(
        &self,
        credential: &Credential,
        job_id: JobId,
        interviewer_id: InterviewerId,
    ) -> Result<(), ConfirmationError> {
        let body = serde_json::json!({ "interviewer_id": interviewer_id });
        self.post_json_no_content(credential, &format!("/uploads/{}/confirm", job_id), &body)
            .await?;

        tracing::info!("Upload confirmed, processing started");
        Ok(())
    }
}

#[async_trait]
impl JobGateway for ApiClient {
    #[tracing::instrument(skip(self, credential), fields(job_id = %job_id))]
    async fn job_status(&self, credential: &Credential, job_id: JobId) -> Result<Job, GatewayError> {
        self.get(credential, &format!("/jobs/{}", job_id), &[]).await
    }

    async fn list_jobs(
        &self,
        credential: &Credential,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, GatewayError> {
        let response: JobListResponse = self.get(credential, "/jobs", &query.to_query()).await?;
        Ok(response.into_items())
    }

    #[tracing::instrument(skip(self, credential), fields(job_id = %job_id))]
    async fn fetch_analysis(
        &self,
        credential: &Credential,
        job_id: JobId,
    ) -> Result<Option<Analysis>, GatewayError> {
        self.get_optional(credential, &format!("/analysis/{}", job_id))
            .await
    }
}

#[async_trait]
impl InterviewerGateway for ApiClient {
    async fn list_interviewers(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Interviewer>, GatewayError> {
        let response: InterviewerListResponse =
            self.get(credential, "/interviewers", &[]).await?;
        Ok(response.into_items())
    }

    #[tracing::instrument(skip(self, credential, request), fields(name = %request.name))]
    async fn create_interviewer(
        &self,
        credential: &Credential,
        request: &CreateInterviewer,
    ) -> Result<Interviewer, GatewayError> {
        request
            .validate()
            .map_err(|e| GatewayError::InvalidRequest(format!("Validation error: {}", e)))?;

        let interviewer: Interviewer = self.post_json(credential, "/interviewers", request).await?;
        tracing::info!(interviewer_id = %interviewer.id, "Interviewer created");
        Ok(interviewer)
    }

    async fn get_interviewer(
        &self,
        credential: &Credential,
        interviewer_id: InterviewerId,
    ) -> Result<Option<Interviewer>, GatewayError> {
        self.get_optional(credential, &format!("/interviewers/{}", interviewer_id))
            .await
    }
}
