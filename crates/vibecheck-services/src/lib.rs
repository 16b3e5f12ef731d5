//! VibeCheck Services Layer
//!
//! Composes the client components into the end-to-end flow:
//! ticket → transfer → confirm → poll → fetch.
//!
//! - [`UploadOrchestrator`] runs the three upload stages and hands the job to a
//!   [`JobTracker`].
//! - [`JobTracker`] follows one job to its terminal state and fetches the
//!   analysis once when it completes. It also re-attaches to jobs submitted
//!   earlier.
//! - [`ResultFetcher`] retrieves and checks a completed job's analysis.
//! - [`JobListView`] keeps the client-side job summaries.

pub mod error;
pub mod job_list;
pub mod orchestrator;
pub mod results;
pub mod tracker;

// Re-export commonly used types
pub use error::{FlowError, TrackError, UploadError, UploadStage};
pub use job_list::JobListView;
pub use orchestrator::UploadOrchestrator;
pub use results::ResultFetcher;
pub use tracker::{JobOutcome, JobTracker};
