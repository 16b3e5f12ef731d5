use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use vibecheck_core::fake::{ScriptedJobGateway, StatusStep};
use vibecheck_core::{Credential, GatewayError, Job, JobId, JobStatus, PollTransportError};
use vibecheck_worker::{
    JobStatusPoller, NoopObserver, PollError, PollObserver, PollerConfig, SessionEnd,
    SessionState,
};

#[derive(Default)]
struct RecordingObserver {
    statuses: Mutex<Vec<JobStatus>>,
    errors: Mutex<Vec<(u32, bool)>>,
}

impl RecordingObserver {
    fn statuses(&self) -> Vec<JobStatus> {
        self.statuses.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<(u32, bool)> {
        self.errors.lock().unwrap().clone()
    }
}

impl PollObserver for RecordingObserver {
    fn on_status(&self, job: &Job) {
        self.statuses.lock().unwrap().push(job.status);
    }

    fn on_transport_error(&self, error: &PollTransportError) {
        let timed_out = matches!(error.source, GatewayError::Timeout(_));
        self.errors.lock().unwrap().push((error.attempt, timed_out));
    }
}

fn config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(5),
        max_attempts: Some(360),
        max_elapsed: Some(Duration::from_secs(1800)),
        fetch_timeout: Duration::from_secs(2),
    }
}

fn token() -> Credential {
    Credential::Bearer("test-token".to_string())
}

fn gaps(gateway: &ScriptedJobGateway, job_id: JobId) -> Vec<Duration> {
    gateway
        .fetch_times(job_id)
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect()
}

/// Test that PENDING, PENDING, COMPLETED takes exactly three fetches at the interval
#[tokio::test(start_paused = true)]
async fn test_converges_after_three_fetches() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(
        job_id,
        &[JobStatus::Pending, JobStatus::Pending, JobStatus::Completed],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let handle = poller.start(token(), job_id, observer.clone());
    let state = handle.subscribe();

    let end = handle.wait().await;

    assert_eq!(end.terminal_status(), Some(JobStatus::Completed));
    assert_eq!(gateway.fetch_count(job_id), 3);
    assert_eq!(gaps(&gateway, job_id), vec![Duration::from_secs(5); 2]);
    assert_eq!(
        observer.statuses(),
        vec![JobStatus::Pending, JobStatus::Pending, JobStatus::Completed]
    );
    assert_eq!(*state.borrow(), SessionState::Converged(JobStatus::Completed));

    // No fetch after delivery
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.fetch_count(job_id), 3);
}

/// Test that a job failure is a normal terminal outcome
#[tokio::test(start_paused = true)]
async fn test_failed_job_converges() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Pending, JobStatus::Failed]);

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, Arc::new(NoopObserver))
        .wait()
        .await;

    match end {
        SessionEnd::Converged(job) => assert_eq!(job.status, JobStatus::Failed),
        other => panic!("unexpected end: {:?}", other),
    }
    assert_eq!(gateway.fetch_count(job_id), 2);
}

/// Test that cancelling before the first fetch yields no terminal delivery
#[tokio::test(start_paused = true)]
async fn test_cancel_before_first_fetch() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Completed]);
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let handle = poller.start(token(), job_id, observer.clone());
    handle.cancel();

    let end = handle.wait().await;
    assert!(matches!(end, SessionEnd::Cancelled));
    assert_eq!(gateway.fetch_count(job_id), 0);
    assert!(observer.statuses().is_empty());
}

/// Test that a fetch resolving after cancellation is discarded
#[tokio::test(start_paused = true)]
async fn test_in_flight_fetch_is_discarded_after_cancel() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    let gate = Arc::new(Notify::new());
    gateway.script(
        job_id,
        [StatusStep::Gated(gate.clone(), JobStatus::Completed)],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let handle = poller.start(token(), job_id, observer.clone());

    // Let the first fetch start and block on the gate
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(gateway.fetch_count(job_id), 1);

    handle.cancel();
    gate.notify_one();

    let end = handle.wait().await;
    assert!(matches!(end, SessionEnd::Cancelled));
    assert!(observer.statuses().is_empty());
    assert_eq!(gateway.fetch_count(job_id), 1);
}

/// Test that a transient failure on attempt #2 of 5 does not stop attempts #3 to #5
#[tokio::test(start_paused = true)]
async fn test_transient_error_keeps_polling() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script(
        job_id,
        [
            StatusStep::Status(JobStatus::Pending),
            StatusStep::TransportError,
            StatusStep::Status(JobStatus::Pending),
            StatusStep::Status(JobStatus::Pending),
            StatusStep::Status(JobStatus::Completed),
        ],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, observer.clone())
        .wait()
        .await;

    assert_eq!(end.terminal_status(), Some(JobStatus::Completed));
    assert_eq!(gateway.fetch_count(job_id), 5);
    assert_eq!(gaps(&gateway, job_id), vec![Duration::from_secs(5); 4]);
    assert_eq!(observer.errors(), vec![(2, false)]);
    assert_eq!(observer.statuses().len(), 4);
}

/// Test that a 5xx answer is transient too
#[tokio::test(start_paused = true)]
async fn test_server_error_is_transient() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script(
        job_id,
        [
            StatusStep::HttpError(503),
            StatusStep::Status(JobStatus::Completed),
        ],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, observer.clone())
        .wait()
        .await;

    assert_eq!(end.terminal_status(), Some(JobStatus::Completed));
    assert_eq!(observer.errors(), vec![(1, false)]);
}

/// Test that a hung fetch times out and counts as a transient failure
#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_is_transient() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script(
        job_id,
        [StatusStep::Hang, StatusStep::Status(JobStatus::Completed)],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, observer.clone())
        .wait()
        .await;

    assert_eq!(end.terminal_status(), Some(JobStatus::Completed));
    assert_eq!(observer.errors(), vec![(1, true)]);
    assert_eq!(gaps(&gateway, job_id), vec![Duration::from_secs(5)]);
}

/// Test that the attempt ceiling ends an endless session in Errored
#[tokio::test(start_paused = true)]
async fn test_attempt_ceiling() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Pending]);

    let poller = JobStatusPoller::new(
        gateway.clone(),
        PollerConfig {
            max_attempts: Some(3),
            ..config()
        },
    );
    let handle = poller.start(token(), job_id, Arc::new(NoopObserver));
    let state = handle.subscribe();
    let end = handle.wait().await;

    assert!(matches!(
        end,
        SessionEnd::Errored(PollError::AttemptsExhausted { attempts: 3, .. })
    ));
    assert_eq!(gateway.fetch_count(job_id), 3);
    assert_eq!(*state.borrow(), SessionState::Errored);
}

/// Test that the elapsed-time ceiling ends an endless session in Errored
#[tokio::test(start_paused = true)]
async fn test_elapsed_ceiling() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Pending]);

    let poller = JobStatusPoller::new(
        gateway.clone(),
        PollerConfig {
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(12)),
            ..config()
        },
    );
    let end = poller
        .start(token(), job_id, Arc::new(NoopObserver))
        .wait()
        .await;

    assert!(matches!(
        end,
        SessionEnd::Errored(PollError::DeadlineExceeded { .. })
    ));
    // Fetches at 0s, 5s and 10s; the 15s tick is past the deadline
    assert_eq!(gateway.fetch_count(job_id), 3);
}

/// Test that an unknown job ends the session instead of polling forever
#[tokio::test(start_paused = true)]
async fn test_not_found_ends_session() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, Arc::new(NoopObserver))
        .wait()
        .await;

    match end {
        SessionEnd::Errored(PollError::Rejected { source, .. }) => {
            assert!(source.is_not_found())
        }
        other => panic!("unexpected end: {:?}", other),
    }
    assert_eq!(gateway.fetch_count(job_id), 1);
}

/// Test that an unreadable status ends the session instead of polling to the ceiling
#[tokio::test(start_paused = true)]
async fn test_unreadable_status_ends_session() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script(
        job_id,
        [
            StatusStep::Status(JobStatus::Pending),
            StatusStep::Malformed("Invalid job status: ARCHIVED".to_string()),
            StatusStep::Status(JobStatus::Completed),
        ],
    );
    let observer = Arc::new(RecordingObserver::default());

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let end = poller
        .start(token(), job_id, observer.clone())
        .wait()
        .await;

    match end {
        SessionEnd::Errored(PollError::Rejected { source, .. }) => {
            assert!(matches!(source, GatewayError::Decode(_)))
        }
        other => panic!("unexpected end: {:?}", other),
    }
    assert_eq!(gateway.fetch_count(job_id), 2);
    assert!(observer.errors().is_empty());
}

/// Test that cancelling after convergence changes nothing
#[tokio::test(start_paused = true)]
async fn test_cancel_after_convergence_is_noop() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Completed]);

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let handle = poller.start(token(), job_id, Arc::new(NoopObserver));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(handle.is_finished());
    handle.cancel();
    handle.cancel();

    assert_eq!(handle.state(), SessionState::Converged(JobStatus::Completed));
    assert_eq!(handle.wait().await.terminal_status(), Some(JobStatus::Completed));
}

/// Test that dropping the handle stops the session
#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let job_id = JobId::new();
    gateway.script_statuses(job_id, &[JobStatus::Pending]);

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let handle = poller.start(token(), job_id, Arc::new(NoopObserver));
    let state = handle.subscribe();

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(gateway.fetch_count(job_id), 2);
    drop(handle);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.fetch_count(job_id), 2);
    assert_eq!(*state.borrow(), SessionState::Cancelled);
}

/// Test that cancelling a parent token stops child sessions
#[tokio::test(start_paused = true)]
async fn test_parent_token_cancels_sessions() {
    let gateway = Arc::new(ScriptedJobGateway::new());
    let first = JobId::new();
    let second = JobId::new();
    gateway.script_statuses(first, &[JobStatus::Pending]);
    gateway.script_statuses(second, &[JobStatus::Pending]);
    let parent = CancellationToken::new();

    let poller = JobStatusPoller::new(gateway.clone(), config());
    let a = poller.start_child(token(), first, Arc::new(NoopObserver), &parent);
    let b = poller.start_child(token(), second, Arc::new(NoopObserver), &parent);

    tokio::time::sleep(Duration::from_secs(11)).await;
    parent.cancel();

    assert!(matches!(a.wait().await, SessionEnd::Cancelled));
    assert!(matches!(b.wait().await, SessionEnd::Cancelled));
    assert_eq!(gateway.fetch_count(first), 3);
    assert_eq!(gateway.fetch_count(second), 3);
}
