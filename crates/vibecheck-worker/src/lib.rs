//! Job status polling.
//!
//! A [`JobStatusPoller`] starts one session per job. Each session is a tokio task
//! that fetches the job's status immediately, then once per interval, until the
//! job reaches a terminal state, the caller cancels, or a ceiling is hit. The
//! caller keeps a [`PollHandle`] to cancel the session, watch its state and await
//! its single [`SessionEnd`].
//!
//! Sessions share nothing: two sessions for the same job are independent.

pub mod config;
pub mod observer;
pub mod poller;
pub mod session;

// Re-export commonly used types
pub use config::PollerConfig;
pub use observer::{NoopObserver, PollObserver};
pub use poller::JobStatusPoller;
pub use session::{PollError, PollHandle, SessionEnd, SessionState};
