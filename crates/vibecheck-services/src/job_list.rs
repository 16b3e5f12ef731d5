//! Client-side job summaries
//!
//! [`JobListView`] caches the jobs the client knows about, keyed by job id.
//! List refreshes go through [`JobListView::refresh`]; per-job updates arrive from
//! polling sessions through the [`PollObserver`] impl. A cached terminal status is
//! never replaced by `Pending` or by the other terminal status.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use vibecheck_core::{Credential, GatewayError, Job, JobGateway, JobId, JobListQuery};
use vibecheck_worker::PollObserver;

pub struct JobListView {
    gateway: Arc<dyn JobGateway>,
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobListView {
    pub fn new(gateway: Arc<dyn JobGateway>) -> Self {
        Self {
            gateway,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the job list and merge it into the cache. Returns the merged view of
    /// the listed jobs, in the order the service listed them.
    pub async fn refresh(
        &self,
        credential: &Credential,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, GatewayError> {
        let listed = self.gateway.list_jobs(credential, query).await?;
        tracing::debug!(count = listed.len(), "Job list refreshed");

        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        Ok(listed
            .into_iter()
            .map(|job| merge(&mut jobs, job).clone())
            .collect())
    }

    /// Merge one job into the cache. Returns false when the update was ignored
    /// because it would move a job out of a terminal status.
    pub fn apply(&self, job: Job) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let incoming = job.status;
        merge(&mut jobs, job).status == incoming
    }

    pub fn get(&self, job_id: JobId) -> Option<Job> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&job_id)
            .cloned()
    }

    /// All cached jobs, newest first.
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn merge(jobs: &mut HashMap<JobId, Job>, job: Job) -> &Job {
    let job_id = job.id;
    match jobs.get_mut(&job_id) {
        Some(cached) if cached.status.is_terminal() && cached.status != job.status => {
            tracing::warn!(
                job_id = %job_id,
                cached = %cached.status,
                incoming = %job.status,
                "Ignoring status update out of a terminal state"
            );
        }
        // Status responses omit list-only fields such as the filename
        Some(cached) => {
            cached.status = job.status;
            cached.error_message = job.error_message;
            cached.updated_at = job.updated_at;
            if job.filename.is_some() {
                cached.filename = job.filename;
            }
        }
        None => {
            jobs.insert(job_id, job);
        }
    }
    // Present: either kept, updated or just inserted
    &jobs[&job_id]
}

impl PollObserver for JobListView {
    fn on_status(&self, job: &Job) {
        self.apply(job.clone());
    }
}
