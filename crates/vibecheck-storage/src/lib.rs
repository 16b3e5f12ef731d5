//! VibeCheck Storage Library
//!
//! Moves a recording straight from the client to durable storage using a
//! single-use [`TransferTicket`](vibecheck_core::TransferTicket). The orchestrating
//! service never sees the bytes.
//!
//! # Transfer shapes
//!
//! - **Form field**: multipart `POST` to the ticket target. The ticket's fields
//!   come first, ordered by name, and the artifact is appended last as `file`.
//! - **Direct**: raw `PUT` of the artifact with its declared content type and any
//!   headers the ticket requires.
//!
//! Transfers never carry the service credential. Progress is published on a
//! `tokio::sync::watch` channel as a non-decreasing percentage.

pub(crate) mod body;
pub mod progress;
pub mod traits;
pub mod uploader;

// Re-export commonly used types
pub use progress::{percent_of, TransferProgress};
pub use traits::{ArtifactTransfer, TransferError, TransferResult};
pub use uploader::DirectUploader;
