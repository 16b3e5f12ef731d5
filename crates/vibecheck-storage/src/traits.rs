//! Transfer abstraction trait
//!
//! This module defines the [`ArtifactTransfer`] trait the orchestrator drives and
//! the [`TransferError`] it fails with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use vibecheck_core::{Artifact, ErrorMetadata, LogLevel, TransferTicket};

use crate::progress::TransferProgress;

/// Transfer errors. Any of them means the upload must not be confirmed.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Transfer failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Transfer timed out after {after:?}")]
    Timeout {
        after: Duration,
        #[source]
        source: reqwest::Error,
    },

    #[error("Storage rejected the transfer ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Transfer ticket expired at {0}")]
    TicketExpired(DateTime<Utc>),

    #[error("Transfer ticket is unusable: {0}")]
    InvalidTicket(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("Failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

impl TransferError {
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        TransferError::Transport {
            message: message.into(),
            source,
        }
    }
}

impl ErrorMetadata for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            TransferError::Transport { .. } => "TRANSFER_FAILED",
            TransferError::Timeout { .. } => "TRANSFER_TIMEOUT",
            TransferError::Rejected { .. } => "TRANSFER_REJECTED",
            TransferError::TicketExpired(_) => "TICKET_EXPIRED",
            TransferError::InvalidTicket(_) => "MALFORMED_TICKET",
            TransferError::InvalidArtifact(_) => "INVALID_ARTIFACT",
            TransferError::Io(_) => "ARTIFACT_UNREADABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A fresh ticket and a new attempt may succeed; the artifact problems won't
        !matches!(
            self,
            TransferError::InvalidArtifact(_) | TransferError::Io(_)
        )
    }

    fn is_user_correctable(&self) -> bool {
        match self {
            TransferError::InvalidArtifact(_) | TransferError::Io(_) => true,
            // EntityTooLarge and friends
            TransferError::Rejected { status, .. } => matches!(status, 400 | 411 | 413 | 415),
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        if self.is_user_correctable() {
            Some("Check the recording file, then upload again")
        } else {
            Some("Retry the upload")
        }
    }

    fn client_message(&self) -> String {
        match self {
            TransferError::Transport { .. } | TransferError::Timeout { .. } => {
                "The recording could not be sent to storage".to_string()
            }
            TransferError::Rejected { .. } => "Storage refused the recording".to_string(),
            TransferError::TicketExpired(_) => "The upload authorization expired".to_string(),
            TransferError::InvalidTicket(_) => {
                "The upload service sent an unusable ticket".to_string()
            }
            TransferError::InvalidArtifact(msg) => msg.clone(),
            TransferError::Io(e) => format!("The recording could not be read: {}", e),
        }
    }

    fn log_level(&self) -> LogLevel {
        if self.is_user_correctable() {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        }
    }
}

/// Direct transfer of an artifact to storage.
///
/// The ticket is consumed: a ticket can back at most one transfer, whether it
/// succeeds or not.
#[async_trait]
pub trait ArtifactTransfer: Send + Sync {
    /// Transfer the artifact to the ticket's destination, publishing progress.
    ///
    /// On success `progress` has reached 100.
    async fn transfer(
        &self,
        ticket: TransferTicket,
        artifact: &Artifact,
        progress: &TransferProgress,
    ) -> TransferResult<()>;
}
