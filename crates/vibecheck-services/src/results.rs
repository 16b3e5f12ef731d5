//! Analysis retrieval for completed jobs.

use std::sync::Arc;
use validator::Validate;
use vibecheck_core::{
    Analysis, Credential, GatewayError, Job, JobGateway, JobStatus, ResultFetchError,
};

/// Fetches the analysis of a job that reached `Completed`.
///
/// A failure is reported, never retried: a completed job without a usable
/// analysis is a consistency problem on the service side.
#[derive(Clone)]
pub struct ResultFetcher {
    gateway: Arc<dyn JobGateway>,
}

impl ResultFetcher {
    pub fn new(gateway: Arc<dyn JobGateway>) -> Self {
        Self { gateway }
    }

    #[tracing::instrument(skip(self, credential, job), fields(job_id = %job.id))]
    pub async fn fetch(
        &self,
        credential: &Credential,
        job: &Job,
    ) -> Result<Analysis, ResultFetchError> {
        let job_id = job.id;
        if job.status != JobStatus::Completed {
            return Err(ResultFetchError::NotCompleted {
                job_id,
                detail: format!("job status is {}", job.status),
            });
        }

        let analysis = match self.gateway.fetch_analysis(credential, job_id).await {
            Ok(Some(analysis)) => analysis,
            Ok(None) => {
                tracing::error!("Completed job has no analysis");
                return Err(ResultFetchError::MissingAnalysis { job_id });
            }
            Err(GatewayError::Status {
                status: 400,
                detail,
            }) => return Err(ResultFetchError::NotCompleted { job_id, detail }),
            Err(e) => return Err(ResultFetchError::Gateway(e)),
        };

        if let Some(owner) = analysis.job_id {
            if owner != job_id {
                return Err(ResultFetchError::Invalid {
                    job_id,
                    reason: format!("analysis belongs to job {}", owner),
                });
            }
        }

        analysis
            .validate()
            .map_err(|e| ResultFetchError::Invalid {
                job_id,
                reason: e.to_string(),
            })?;

        tracing::info!(
            word_count = analysis.word_count,
            sentiment_score = analysis.sentiment_score,
            "Analysis retrieved"
        );
        Ok(analysis)
    }
}
