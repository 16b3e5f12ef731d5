//! Session observers
//!
//! A [`PollObserver`] is told about every status a session fetches and every
//! transient fetch failure. Observers run inline on the session task, so they
//! must return quickly and must not block.

use vibecheck_core::{Job, PollTransportError};

pub trait PollObserver: Send + Sync {
    /// A status fetch succeeded. Called for the terminal status too, before the
    /// session ends.
    fn on_status(&self, _job: &Job) {}

    /// A status fetch failed transiently; the session keeps polling.
    fn on_transport_error(&self, _error: &PollTransportError) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl PollObserver for NoopObserver {}
