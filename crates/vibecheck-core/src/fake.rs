//! Scripted in-memory gateways for tests
//!
//! These fakes let the poller, the result fetcher and the orchestrator be tested
//! without an HTTP server. Status fetches follow a per-job script and every call
//! is recorded with its (virtual) time.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::credential::Credential;
use crate::error::{ConfirmationError, GatewayError, TicketRequestError};
use crate::gateway::{JobGateway, UploadGateway};
use crate::models::{
    Analysis, DirectTicket, FormFieldTicket, InterviewerId, Job, JobId, JobListQuery, JobStatus,
    TicketRequest, TransferShape, TransferTicket,
};

/// One scripted answer to `job_status`.
#[derive(Debug, Clone)]
pub enum StatusStep {
    Status(JobStatus),
    /// Connection-level failure (transient).
    TransportError,
    /// The service answers with this HTTP status.
    HttpError(u16),
    /// A successful answer whose body cannot be decoded.
    Malformed(String),
    /// Never resolves.
    Hang,
    /// Resolves with the status once the gate is notified.
    Gated(Arc<Notify>, JobStatus),
}

pub fn job(id: JobId, status: JobStatus) -> Job {
    Job {
        id,
        status,
        created_at: Utc::now(),
        filename: None,
        error_message: None,
        updated_at: None,
    }
}

pub fn analysis(job_id: JobId) -> Analysis {
    Analysis {
        id: None,
        job_id: Some(job_id),
        technical_score: 8.0,
        communication_score: 7.5,
        sentiment_score: 0.8,
        word_count: 4200,
        executive_summary: "Clear and structured answers.".to_string(),
    }
}

#[derive(Default)]
pub struct ScriptedJobGateway {
    scripts: Mutex<HashMap<JobId, VecDeque<StatusStep>>>,
    last_status: Mutex<HashMap<JobId, JobStatus>>,
    fetches: Mutex<Vec<(JobId, Instant)>>,
    analyses: Mutex<HashMap<JobId, Option<Analysis>>>,
    analysis_fetches: Mutex<Vec<JobId>>,
    listed: Mutex<Vec<Job>>,
}

impl ScriptedJobGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, job_id: JobId, steps: impl IntoIterator<Item = StatusStep>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(job_id)
            .or_default()
            .extend(steps);
    }

    /// Convenience for a script made only of statuses.
    pub fn script_statuses(&self, job_id: JobId, statuses: &[JobStatus]) {
        self.script(job_id, statuses.iter().copied().map(StatusStep::Status));
    }

    pub fn set_analysis(&self, job_id: JobId, analysis: Option<Analysis>) {
        self.analyses.lock().unwrap().insert(job_id, analysis);
    }

    pub fn set_listed_jobs(&self, jobs: Vec<Job>) {
        *self.listed.lock().unwrap() = jobs;
    }

    pub fn fetch_count(&self, job_id: JobId) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == job_id)
            .count()
    }

    /// Virtual instants at which `job_status` was called for `job_id`.
    pub fn fetch_times(&self, job_id: JobId) -> Vec<Instant> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == job_id)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn analysis_fetch_count(&self, job_id: JobId) -> usize {
        self.analysis_fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == job_id)
            .count()
    }
}

#[async_trait]
impl JobGateway for ScriptedJobGateway {
    async fn job_status(&self, _credential: &Credential, job_id: JobId) -> Result<Job, GatewayError> {
        self.fetches.lock().unwrap().push((job_id, Instant::now()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&job_id)
            .and_then(|steps| steps.pop_front());
        let sticky = self.last_status.lock().unwrap().get(&job_id).copied();

        let status = match step {
            Some(StatusStep::Status(status)) => status,
            Some(StatusStep::TransportError) => {
                return Err(GatewayError::transport(
                    "connection reset",
                    anyhow::anyhow!("scripted transport failure"),
                ))
            }
            Some(StatusStep::HttpError(status)) => {
                return Err(GatewayError::Status {
                    status,
                    detail: "scripted failure".to_string(),
                })
            }
            Some(StatusStep::Malformed(body)) => {
                return Err(GatewayError::Decode(format!(
                    "Failed to parse response as JSON: {}",
                    body
                )))
            }
            Some(StatusStep::Hang) => std::future::pending::<JobStatus>().await,
            Some(StatusStep::Gated(gate, status)) => {
                gate.notified().await;
                status
            }
            // An exhausted script keeps answering with the last status
            None => match sticky {
                Some(status) => status,
                None => {
                    return Err(GatewayError::Status {
                        status: 404,
                        detail: "Job not found".to_string(),
                    })
                }
            },
        };

        self.last_status.lock().unwrap().insert(job_id, status);
        Ok(job(job_id, status))
    }

    async fn list_jobs(
        &self,
        _credential: &Credential,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, GatewayError> {
        let jobs = self.listed.lock().unwrap().clone();
        Ok(jobs
            .into_iter()
            .filter(|job| query.status.map_or(true, |s| job.status == s))
            .collect())
    }

    async fn fetch_analysis(
        &self,
        _credential: &Credential,
        job_id: JobId,
    ) -> Result<Option<Analysis>, GatewayError> {
        self.analysis_fetches.lock().unwrap().push(job_id);
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .flatten())
    }
}

/// Calls seen by [`FakeUploadGateway`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadCall {
    Ticket {
        filename: String,
        content_type: String,
    },
    Confirm {
        job_id: JobId,
        interviewer_id: InterviewerId,
    },
}

type ConfirmHook = Box<dyn Fn(JobId) + Send + Sync>;

pub struct FakeUploadGateway {
    job_id: JobId,
    target: String,
    shape: TransferShape,
    fields: BTreeMap<String, String>,
    ticket_failure: Mutex<Option<u16>>,
    confirm_failure: Mutex<Option<u16>>,
    confirm_hook: Mutex<Option<ConfirmHook>>,
    calls: Mutex<Vec<UploadCall>>,
}

impl FakeUploadGateway {
    /// Issues tickets for `job_id` pointing at `target`.
    pub fn new(job_id: JobId, target: impl Into<String>, shape: TransferShape) -> Self {
        Self {
            job_id,
            target: target.into(),
            shape,
            fields: BTreeMap::new(),
            ticket_failure: Mutex::new(None),
            confirm_failure: Mutex::new(None),
            confirm_hook: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn fail_ticket_with(&self, status: u16) {
        *self.ticket_failure.lock().unwrap() = Some(status);
    }

    pub fn fail_confirm_with(&self, status: u16) {
        *self.confirm_failure.lock().unwrap() = Some(status);
    }

    /// Run `hook` at the moment a confirmation arrives.
    pub fn on_confirm(&self, hook: impl Fn(JobId) + Send + Sync + 'static) {
        *self.confirm_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn confirm_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, UploadCall::Confirm { .. }))
            .count()
    }
}

#[async_trait]
impl UploadGateway for FakeUploadGateway {
    async fn request_ticket(
        &self,
        _credential: &Credential,
        request: &TicketRequest,
    ) -> Result<TransferTicket, TicketRequestError> {
        self.calls.lock().unwrap().push(UploadCall::Ticket {
            filename: request.filename.clone(),
            content_type: request.content_type.clone(),
        });

        if let Some(status) = *self.ticket_failure.lock().unwrap() {
            return Err(GatewayError::Status {
                status,
                detail: "scripted ticket failure".to_string(),
            }
            .into());
        }

        let ticket = match self.shape {
            TransferShape::FormField => TransferTicket::FormField(FormFieldTicket {
                target: self.target.clone(),
                fields: self.fields.clone(),
                job_id: self.job_id,
                expires_at: None,
            }),
            TransferShape::Direct => TransferTicket::Direct(DirectTicket {
                target: self.target.clone(),
                headers: BTreeMap::new(),
                job_id: self.job_id,
                expires_at: None,
            }),
        };
        Ok(ticket)
    }

    async fn confirm_upload(
        &self,
        _credential: &Credential,
        job_id: JobId,
        interviewer_id: InterviewerId,
    ) -> Result<(), ConfirmationError> {
        self.calls.lock().unwrap().push(UploadCall::Confirm {
            job_id,
            interviewer_id,
        });

        if let Some(hook) = self.confirm_hook.lock().unwrap().as_ref() {
            hook(job_id);
        }

        if let Some(status) = *self.confirm_failure.lock().unwrap() {
            return Err(GatewayError::Status {
                status,
                detail: "scripted confirm failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
