//! Upload orchestration: ticket → transfer → confirm, then tracking.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use vibecheck_core::{Artifact, Credential, InterviewerId, JobId, UploadGateway};
use vibecheck_storage::{ArtifactTransfer, TransferProgress};

use crate::error::{FlowError, UploadError};
use crate::tracker::{JobOutcome, JobTracker};

/// Sequences the upload stages for one artifact and hands the resulting job to a
/// [`JobTracker`]. Each stage only runs after the previous one succeeded.
#[derive(Clone)]
pub struct UploadOrchestrator {
    uploads: Arc<dyn UploadGateway>,
    transfer: Arc<dyn ArtifactTransfer>,
    tracker: JobTracker,
}

impl UploadOrchestrator {
    pub fn new(
        uploads: Arc<dyn UploadGateway>,
        transfer: Arc<dyn ArtifactTransfer>,
        tracker: JobTracker,
    ) -> Self {
        Self {
            uploads,
            transfer,
            tracker,
        }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Request a ticket, transfer the artifact and confirm the upload.
    ///
    /// Returns the job id once processing has been started. The first failing
    /// stage aborts the rest; in particular nothing is confirmed after a failed
    /// transfer.
    #[tracing::instrument(
        skip(self, credential, artifact, progress),
        fields(filename = %artifact.name, interviewer_id = %interviewer_id)
    )]
    pub async fn submit(
        &self,
        credential: &Credential,
        artifact: &Artifact,
        interviewer_id: InterviewerId,
        progress: &TransferProgress,
    ) -> Result<JobId, UploadError> {
        let start = Instant::now();

        let ticket = self
            .uploads
            .request_ticket(credential, &artifact.ticket_request())
            .await?;
        let job_id = ticket.job_id();

        // The ticket is consumed here whatever the result
        self.transfer
            .transfer(ticket, artifact, progress)
            .await
            .map_err(|source| UploadError::Transfer { job_id, source })?;

        self.uploads
            .confirm_upload(credential, job_id, interviewer_id)
            .await
            .map_err(|source| UploadError::Confirmation { job_id, source })?;

        tracing::info!(
            job_id = %job_id,
            size_bytes = artifact.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload submitted"
        );
        Ok(job_id)
    }

    /// Submit the artifact, then follow the job to its outcome.
    pub async fn run(
        &self,
        credential: &Credential,
        artifact: &Artifact,
        interviewer_id: InterviewerId,
        progress: &TransferProgress,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FlowError> {
        let job_id = self
            .submit(credential, artifact, interviewer_id, progress)
            .await?;

        self.tracker
            .track(credential, job_id, cancel)
            .await
            .map_err(|source| FlowError::Track { job_id, source })
    }

    /// Re-attach to a job submitted earlier.
    pub async fn resume(
        &self,
        credential: &Credential,
        job_id: JobId,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FlowError> {
        self.tracker
            .track(credential, job_id, cancel)
            .await
            .map_err(|source| FlowError::Track { job_id, source })
    }
}
