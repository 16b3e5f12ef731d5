use async_trait::async_trait;
use mockito::{Matcher, Server};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vibecheck_core::fake::{analysis, job, FakeUploadGateway, ScriptedJobGateway, UploadCall};
use vibecheck_core::{
    Artifact, ConfirmationError, Credential, ErrorMetadata, InterviewerId, JobId, JobListQuery,
    JobStatus, ResultFetchError, TicketRequestError, TransferShape, TransferTicket,
};
use vibecheck_services::{
    FlowError, JobListView, JobOutcome, JobTracker, TrackError, UploadError, UploadOrchestrator,
    UploadStage,
};
use vibecheck_storage::{
    ArtifactTransfer, DirectUploader, TransferError, TransferProgress, TransferResult,
};
use vibecheck_worker::PollerConfig;

/// Transfer double that records the ticket shape it was handed.
#[derive(Default)]
struct FakeTransfer {
    fail_with: Option<u16>,
    calls: Mutex<Vec<(JobId, TransferShape)>>,
}

impl FakeTransfer {
    fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(JobId, TransferShape)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactTransfer for FakeTransfer {
    async fn transfer(
        &self,
        ticket: TransferTicket,
        _artifact: &Artifact,
        progress: &TransferProgress,
    ) -> TransferResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((ticket.job_id(), ticket.shape()));
        progress.advance(50);
        if let Some(status) = self.fail_with {
            return Err(TransferError::Rejected {
                status,
                detail: "AccessDenied".to_string(),
            });
        }
        progress.complete();
        Ok(())
    }
}

fn token() -> Credential {
    Credential::Bearer("test-token".to_string())
}

fn poller_config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(5),
        fetch_timeout: Duration::from_secs(2),
        ..PollerConfig::default()
    }
}

fn recording() -> Artifact {
    Artifact::from_bytes("interview.mp4", "video/mp4", vec![b'a'; 1024])
}

struct Harness {
    job_id: JobId,
    interviewer_id: InterviewerId,
    uploads: Arc<FakeUploadGateway>,
    transfer: Arc<FakeTransfer>,
    jobs: Arc<ScriptedJobGateway>,
    orchestrator: UploadOrchestrator,
}

fn harness(transfer: FakeTransfer) -> Harness {
    let job_id = JobId::new();
    let uploads = Arc::new(FakeUploadGateway::new(
        job_id,
        "https://bucket.example.com/",
        TransferShape::FormField,
    ));
    let transfer = Arc::new(transfer);
    let jobs = Arc::new(ScriptedJobGateway::new());
    let tracker = JobTracker::new(jobs.clone(), poller_config());
    let orchestrator = UploadOrchestrator::new(uploads.clone(), transfer.clone(), tracker);

    Harness {
        job_id,
        interviewer_id: InterviewerId::from(JobId::new().as_uuid()),
        uploads,
        transfer,
        jobs,
        orchestrator,
    }
}

/// Test the whole flow against a storage server: 10 MiB form-field upload, progress at
/// 100 before confirmation, three status fetches, one analysis fetch
#[tokio::test]
async fn test_end_to_end_form_field_upload() {
    let mut server = Server::new_async().await;
    let storage = server
        .mock("POST", "/bucket")
        .match_body(Matcher::Regex(
            r#"(?s)name="key".*name="policy".*name="file"; filename="interview.mp4""#.to_string(),
        ))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let direct = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let job_id = JobId::new();
    let interviewer_id = InterviewerId::from(JobId::new().as_uuid());
    let mut fields = BTreeMap::new();
    fields.insert("key".to_string(), "uploads/abc".to_string());
    fields.insert("policy".to_string(), "...".to_string());
    let uploads = Arc::new(
        FakeUploadGateway::new(
            job_id,
            format!("{}/bucket", server.url()),
            TransferShape::FormField,
        )
        .with_fields(fields),
    );

    let (progress, _rx) = TransferProgress::channel();
    let progress_at_confirm = Arc::new(Mutex::new(None));
    {
        let progress = progress.clone();
        let seen = progress_at_confirm.clone();
        uploads.on_confirm(move |_| {
            *seen.lock().unwrap() = Some(progress.current());
        });
    }

    let jobs = Arc::new(ScriptedJobGateway::new());
    jobs.script_statuses(
        job_id,
        &[JobStatus::Pending, JobStatus::Pending, JobStatus::Completed],
    );
    jobs.set_analysis(job_id, Some(analysis(job_id)));

    let tracker = JobTracker::new(
        jobs.clone(),
        PollerConfig {
            interval: Duration::from_millis(10),
            fetch_timeout: Duration::from_secs(1),
            ..PollerConfig::default()
        },
    );
    let uploader = DirectUploader::new(Duration::from_secs(30)).unwrap();
    let orchestrator = UploadOrchestrator::new(uploads.clone(), Arc::new(uploader), tracker);

    let artifact = Artifact::from_bytes("interview.mp4", "video/mp4", vec![b'a'; 10_485_760]);
    let outcome = orchestrator
        .run(
            &token(),
            &artifact,
            interviewer_id,
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match outcome {
        JobOutcome::Completed { job, analysis } => {
            assert_eq!(job.id, job_id);
            assert_eq!(analysis.job_id, Some(job_id));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*progress_at_confirm.lock().unwrap(), Some(100));
    assert_eq!(
        uploads.calls(),
        vec![
            UploadCall::Ticket {
                filename: "interview.mp4".to_string(),
                content_type: "video/mp4".to_string(),
            },
            UploadCall::Confirm {
                job_id,
                interviewer_id,
            },
        ]
    );
    assert_eq!(jobs.fetch_count(job_id), 3);
    assert_eq!(jobs.analysis_fetch_count(job_id), 1);
    storage.assert_async().await;
    direct.assert_async().await;
}

/// Test that a failed job is surfaced without fetching an analysis
#[tokio::test(start_paused = true)]
async fn test_failed_job_never_fetches_analysis() {
    let h = harness(FakeTransfer::default());
    h.jobs
        .script_statuses(h.job_id, &[JobStatus::Pending, JobStatus::Failed]);

    let outcome = h
        .orchestrator
        .run(
            &token(),
            &recording(),
            h.interviewer_id,
            &TransferProgress::discard(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::Failed { .. }));
    assert_eq!(outcome.job().status, JobStatus::Failed);
    assert_eq!(h.jobs.fetch_count(h.job_id), 2);
    assert_eq!(h.jobs.analysis_fetch_count(h.job_id), 0);
}

/// Test that a ticket failure stops before any transfer
#[tokio::test(start_paused = true)]
async fn test_ticket_failure_aborts() {
    let h = harness(FakeTransfer::default());
    h.uploads.fail_ticket_with(503);

    let err = h
        .orchestrator
        .run(
            &token(),
            &recording(),
            h.interviewer_id,
            &TransferProgress::discard(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match &err {
        FlowError::Upload(UploadError::Ticket(TicketRequestError::Rejected { status, .. })) => {
            assert_eq!(*status, 503)
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_recoverable());
    assert!(err.job_id().is_none());
    assert!(h.transfer.calls().is_empty());
    assert_eq!(h.uploads.confirm_count(), 0);
    assert_eq!(h.jobs.fetch_count(h.job_id), 0);
}

/// Test that a failed transfer is never confirmed
#[tokio::test(start_paused = true)]
async fn test_transfer_failure_skips_confirmation() {
    let h = harness(FakeTransfer::failing(403));
    let (progress, _rx) = TransferProgress::channel();

    let err = h
        .orchestrator
        .submit(&token(), &recording(), h.interviewer_id, &progress)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), UploadStage::Transfer);
    assert_eq!(err.job_id(), Some(h.job_id));
    assert!(matches!(
        err,
        UploadError::Transfer {
            source: TransferError::Rejected { status: 403, .. },
            ..
        }
    ));
    assert_eq!(h.transfer.calls(), vec![(h.job_id, TransferShape::FormField)]);
    assert_eq!(h.uploads.confirm_count(), 0);
    assert!(progress.current() < 100);
}

/// Test that an unknown interviewer is reported as user-correctable and nothing is polled
#[tokio::test(start_paused = true)]
async fn test_confirmation_interviewer_not_found() {
    let h = harness(FakeTransfer::default());
    h.uploads.fail_confirm_with(404);

    let err = h
        .orchestrator
        .run(
            &token(),
            &recording(),
            h.interviewer_id,
            &TransferProgress::discard(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlowError::Upload(UploadError::Confirmation {
            source: ConfirmationError::InterviewerNotFound { .. },
            ..
        })
    ));
    assert!(err.is_user_correctable());
    assert_eq!(h.uploads.confirm_count(), 1);
    assert_eq!(h.jobs.fetch_count(h.job_id), 0);
}

/// Test that a completed job without analysis is a result error, not a job failure
#[tokio::test(start_paused = true)]
async fn test_missing_analysis_is_reported() {
    let h = harness(FakeTransfer::default());
    h.jobs.script_statuses(h.job_id, &[JobStatus::Completed]);

    let err = h
        .orchestrator
        .run(
            &token(),
            &recording(),
            h.interviewer_id,
            &TransferProgress::discard(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        FlowError::Track { job_id, source } => {
            assert_eq!(job_id, h.job_id);
            assert!(matches!(
                source,
                TrackError::Result(ResultFetchError::MissingAnalysis { .. })
            ));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.jobs.analysis_fetch_count(h.job_id), 1);
}

/// Test that a cancelled session can be resumed with the same job id
#[tokio::test(start_paused = true)]
async fn test_resume_after_cancel() {
    let h = harness(FakeTransfer::default());
    h.jobs.script_statuses(
        h.job_id,
        &[
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Completed,
        ],
    );
    h.jobs.set_analysis(h.job_id, Some(analysis(h.job_id)));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(6)).await;
        trigger.cancel();
    });

    let err = h
        .orchestrator
        .run(
            &token(),
            &recording(),
            h.interviewer_id,
            &TransferProgress::discard(),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FlowError::Track {
            source: TrackError::Cancelled { .. },
            ..
        }
    ));
    assert_eq!(h.jobs.fetch_count(h.job_id), 2);
    assert_eq!(h.jobs.analysis_fetch_count(h.job_id), 0);

    let outcome = h
        .orchestrator
        .resume(&token(), h.job_id, &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::Completed { .. }));
    assert_eq!(h.jobs.fetch_count(h.job_id), 4);
    assert_eq!(h.jobs.analysis_fetch_count(h.job_id), 1);
}

/// Test that tracking feeds the job list view and a stale list cannot regress it
#[tokio::test(start_paused = true)]
async fn test_tracking_updates_job_list_view() {
    let jobs = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    jobs.script_statuses(job_id, &[JobStatus::Pending, JobStatus::Failed]);
    jobs.set_listed_jobs(vec![job(job_id, JobStatus::Pending)]);

    let view = Arc::new(JobListView::new(jobs.clone()));
    let tracker = JobTracker::new(jobs.clone(), poller_config()).with_view(view.clone());

    let outcome = tracker
        .track(&token(), job_id, &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, JobOutcome::Failed { .. }));
    assert_eq!(view.get(job_id).unwrap().status, JobStatus::Failed);

    let listed = view
        .refresh(&token(), &JobListQuery::default())
        .await
        .unwrap();
    assert_eq!(listed[0].status, JobStatus::Failed);
}
