pub mod analysis;
pub mod artifact;
pub mod interviewer;
pub mod job;
pub mod ticket;

pub use analysis::Analysis;
pub use artifact::{content_type_for_path, Artifact, ArtifactSource};
pub use interviewer::{CreateInterviewer, Interviewer, InterviewerId};
pub use job::{Job, JobId, JobListQuery, JobStatus};
pub use ticket::{
    DirectTicket, FormFieldTicket, TicketRequest, TicketResponse, TransferShape, TransferTicket,
};
