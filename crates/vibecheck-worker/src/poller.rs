//! Polling sessions: one tokio task per tracked job.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use vibecheck_core::{Credential, GatewayError, JobGateway, JobId, PollTransportError};

use crate::config::PollerConfig;
use crate::observer::PollObserver;
use crate::session::{PollError, PollHandle, SessionEnd, SessionState};

/// Starts polling sessions against a [`JobGateway`].
#[derive(Clone)]
pub struct JobStatusPoller {
    gateway: Arc<dyn JobGateway>,
    config: PollerConfig,
}

impl JobStatusPoller {
    pub fn new(gateway: Arc<dyn JobGateway>, config: PollerConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Start a session for `job_id`. The first fetch is issued immediately.
    pub fn start(
        &self,
        credential: Credential,
        job_id: JobId,
        observer: Arc<dyn PollObserver>,
    ) -> PollHandle {
        self.start_with_cancel(credential, job_id, observer, CancellationToken::new())
    }

    /// Start a session that also stops when `parent` is cancelled.
    pub fn start_child(
        &self,
        credential: Credential,
        job_id: JobId,
        observer: Arc<dyn PollObserver>,
        parent: &CancellationToken,
    ) -> PollHandle {
        self.start_with_cancel(credential, job_id, observer, parent.child_token())
    }

    fn start_with_cancel(
        &self,
        credential: Credential,
        job_id: JobId,
        observer: Arc<dyn PollObserver>,
        cancel: CancellationToken,
    ) -> PollHandle {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let session = Session {
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            credential,
            job_id,
            observer,
            cancel: cancel.clone(),
            state: state_tx,
        };
        let span = tracing::info_span!("poll_session", job_id = %job_id);
        let task = tokio::spawn(session.run().instrument(span));

        PollHandle::new(job_id, cancel, state_rx, task)
    }
}

struct Session {
    gateway: Arc<dyn JobGateway>,
    config: PollerConfig,
    credential: Credential,
    job_id: JobId,
    observer: Arc<dyn PollObserver>,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl Session {
    async fn run(self) -> SessionEnd {
        let job_id = self.job_id;
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        self.state.send_replace(SessionState::Polling { attempts });
        tracing::debug!(
            interval_secs = self.config.interval.as_secs_f64(),
            max_attempts = ?self.config.max_attempts,
            "Polling session started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(attempts),
                _ = interval.tick() => {}
            }

            if let Some(max_elapsed) = self.config.max_elapsed {
                let elapsed = started.elapsed();
                if elapsed >= max_elapsed {
                    return self.errored(PollError::DeadlineExceeded { job_id, elapsed });
                }
            }

            attempts += 1;
            let fetch = tokio::time::timeout(
                self.config.fetch_timeout,
                self.gateway.job_status(&self.credential, job_id),
            );
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(attempts),
                result = fetch => result,
            };

            let result = match result {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(self.config.fetch_timeout)),
            };

            match result {
                Ok(job) => {
                    if job.status.is_terminal() {
                        drop(interval);
                        tracing::info!(
                            status = %job.status,
                            attempts,
                            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                            "Job reached terminal status"
                        );
                        self.state
                            .send_replace(SessionState::Converged(job.status));
                        self.observer.on_status(&job);
                        return SessionEnd::Converged(job);
                    }

                    tracing::debug!(status = %job.status, attempt = attempts, "Job still pending");
                    self.state.send_replace(SessionState::Polling { attempts });
                    self.observer.on_status(&job);
                }
                Err(source) if source.is_transient() => {
                    let error = PollTransportError {
                        job_id,
                        attempt: attempts,
                        source,
                    };
                    tracing::warn!(error = %error, attempt = attempts, "Status fetch failed, will retry");
                    self.state.send_replace(SessionState::Polling { attempts });
                    self.observer.on_transport_error(&error);
                }
                Err(source) => {
                    return self.errored(PollError::Rejected { job_id, source });
                }
            }

            if let Some(max_attempts) = self.config.max_attempts {
                if attempts >= max_attempts {
                    return self.errored(PollError::AttemptsExhausted { job_id, attempts });
                }
            }
        }
    }

    fn cancelled(&self, attempts: u32) -> SessionEnd {
        tracing::info!(attempts, "Polling session cancelled");
        self.state.send_replace(SessionState::Cancelled);
        SessionEnd::Cancelled
    }

    fn errored(&self, error: PollError) -> SessionEnd {
        tracing::error!(error = %error, "Polling session ended without a terminal status");
        self.state.send_replace(SessionState::Errored);
        SessionEnd::Errored(error)
    }
}
