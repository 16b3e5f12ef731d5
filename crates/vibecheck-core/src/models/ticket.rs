use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use validator::{Validate, ValidationError};

use crate::error::TicketRequestError;
use crate::models::JobId;

/// Request for a transfer ticket (`POST /uploads/ticket`).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct TicketRequest {
    /// Original filename
    #[validate(
        length(
            min = 1,
            max = 255,
            message = "Filename must be between 1 and 255 characters"
        ),
        custom(function = "validate_filename")
    )]
    pub filename: String,
    /// Content type (MIME type) of the recording
    #[validate(
        length(
            min = 1,
            max = 255,
            message = "Content type must be between 1 and 255 characters"
        ),
        custom(function = "validate_media_content_type")
    )]
    pub content_type: String,
}

fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::new("filename_path")
            .with_message("Filename must not contain path separators".into()));
    }
    if filename.trim().is_empty() {
        return Err(ValidationError::new("filename_blank")
            .with_message("Filename cannot be blank".into()));
    }
    Ok(())
}

fn validate_media_content_type(content_type: &str) -> Result<(), ValidationError> {
    let lower = content_type.to_lowercase();
    if lower.starts_with("audio/") || lower.starts_with("video/") {
        Ok(())
    } else {
        Err(ValidationError::new("content_type")
            .with_message("Content type must be an audio or video type".into()))
    }
}

/// Wire shape of a ticket as the service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketResponse {
    #[serde(alias = "upload_url")]
    pub upload_target: String,
    /// Present (even empty) means a form-field upload.
    #[serde(default)]
    pub upload_fields: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub upload_headers: Option<BTreeMap<String, String>>,
    pub job_id: JobId,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Which of the two upload protocols a ticket requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferShape {
    /// Multipart form POST, ticket fields first, artifact last.
    FormField,
    /// Raw body PUT with the artifact's content type.
    Direct,
}

impl Display for TransferShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransferShape::FormField => write!(f, "form_field"),
            TransferShape::Direct => write!(f, "direct"),
        }
    }
}

#[derive(Debug)]
pub struct FormFieldTicket {
    pub target: String,
    pub fields: BTreeMap<String, String>,
    pub job_id: JobId,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct DirectTicket {
    pub target: String,
    pub headers: BTreeMap<String, String>,
    pub job_id: JobId,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Single-use write capability for one artifact.
///
/// Not `Clone`: the uploader takes it by value, so a ticket cannot be used twice.
#[derive(Debug)]
pub enum TransferTicket {
    FormField(FormFieldTicket),
    Direct(DirectTicket),
}

impl TransferTicket {
    pub fn job_id(&self) -> JobId {
        match self {
            TransferTicket::FormField(t) => t.job_id,
            TransferTicket::Direct(t) => t.job_id,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            TransferTicket::FormField(t) => &t.target,
            TransferTicket::Direct(t) => &t.target,
        }
    }

    pub fn shape(&self) -> TransferShape {
        match self {
            TransferTicket::FormField(_) => TransferShape::FormField,
            TransferTicket::Direct(_) => TransferShape::Direct,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TransferTicket::FormField(t) => t.expires_at,
            TransferTicket::Direct(t) => t.expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires| expires <= now)
    }
}

impl TryFrom<TicketResponse> for TransferTicket {
    type Error = TicketRequestError;

    fn try_from(response: TicketResponse) -> Result<Self, Self::Error> {
        let target = response.upload_target.trim().to_string();
        if !(target.starts_with("http://") || target.starts_with("https://")) {
            return Err(TicketRequestError::Malformed(format!(
                "upload target is not an http(s) URL: {:?}",
                response.upload_target
            )));
        }

        let ticket = match response.upload_fields {
            Some(fields) => TransferTicket::FormField(FormFieldTicket {
                target,
                fields,
                job_id: response.job_id,
                expires_at: response.expires_at,
            }),
            None => TransferTicket::Direct(DirectTicket {
                target,
                headers: response.upload_headers.unwrap_or_default(),
                job_id: response.job_id,
                expires_at: response.expires_at,
            }),
        };
        Ok(ticket)
    }
}
