//! Follow a job to its outcome.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vibecheck_core::{Analysis, Credential, Job, JobGateway, JobId, JobStatus};
use vibecheck_worker::{
    JobStatusPoller, NoopObserver, PollHandle, PollObserver, PollerConfig, SessionEnd,
};

use crate::error::TrackError;
use crate::job_list::JobListView;
use crate::results::ResultFetcher;

/// How a tracked job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { job: Job, analysis: Analysis },
    /// The job itself failed. Not an error of the client; there is no analysis.
    Failed { job: Job },
}

impl JobOutcome {
    pub fn job(&self) -> &Job {
        match self {
            JobOutcome::Completed { job, .. } | JobOutcome::Failed { job } => job,
        }
    }
}

/// Runs a polling session for a job and fetches the analysis exactly once if the
/// job completes.
#[derive(Clone)]
pub struct JobTracker {
    poller: JobStatusPoller,
    results: ResultFetcher,
    view: Option<Arc<JobListView>>,
}

impl JobTracker {
    pub fn new(gateway: Arc<dyn JobGateway>, config: PollerConfig) -> Self {
        Self {
            poller: JobStatusPoller::new(gateway.clone(), config),
            results: ResultFetcher::new(gateway),
            view: None,
        }
    }

    /// Route every status a session sees into `view`.
    pub fn with_view(mut self, view: Arc<JobListView>) -> Self {
        self.view = Some(view);
        self
    }

    fn observer(&self) -> Arc<dyn PollObserver> {
        match &self.view {
            Some(view) => view.clone() as Arc<dyn PollObserver>,
            None => Arc::new(NoopObserver),
        }
    }

    /// Start a session without waiting for it. Cancelling `parent` stops it.
    pub fn watch(
        &self,
        credential: &Credential,
        job_id: JobId,
        parent: &CancellationToken,
    ) -> PollHandle {
        self.poller
            .start_child(credential.clone(), job_id, self.observer(), parent)
    }

    /// Follow `job_id` to its outcome.
    ///
    /// Works for any job id the service knows, so a caller whose earlier session
    /// ended can re-attach with a fresh one.
    #[tracing::instrument(skip(self, credential, parent), fields(job_id = %job_id))]
    pub async fn track(
        &self,
        credential: &Credential,
        job_id: JobId,
        parent: &CancellationToken,
    ) -> Result<JobOutcome, TrackError> {
        let handle = self.watch(credential, job_id, parent);
        self.outcome(credential, job_id, handle).await
    }

    /// Turn a session's end into an outcome, fetching the analysis on completion.
    pub async fn outcome(
        &self,
        credential: &Credential,
        job_id: JobId,
        handle: PollHandle,
    ) -> Result<JobOutcome, TrackError> {
        match handle.wait().await {
            SessionEnd::Converged(job) if job.status == JobStatus::Completed => {
                let analysis = self.results.fetch(credential, &job).await?;
                Ok(JobOutcome::Completed { job, analysis })
            }
            SessionEnd::Converged(job) => {
                tracing::info!(
                    error_message = job.error_message.as_deref().unwrap_or("none"),
                    "Job failed"
                );
                Ok(JobOutcome::Failed { job })
            }
            SessionEnd::Cancelled => Err(TrackError::Cancelled { job_id }),
            SessionEnd::Errored(e) => Err(TrackError::Poll(e)),
        }
    }
}
