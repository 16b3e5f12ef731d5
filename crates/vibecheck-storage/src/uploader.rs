//! Direct uploader implementation

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use std::time::{Duration, Instant};
use vibecheck_core::{Artifact, ClientConfig, DirectTicket, FormFieldTicket, TransferTicket};

use crate::body::{artifact_stream, DEFAULT_CHUNK_SIZE};
use crate::progress::TransferProgress;
use crate::traits::{ArtifactTransfer, TransferError, TransferResult};

/// Name of the multipart part carrying the artifact. Storage form policies expect
/// it after every other field.
const FILE_FIELD: &str = "file";

/// Transfers artifacts straight to storage over HTTP.
///
/// Holds its own HTTP client: storage lives outside the service's auth boundary
/// and transfers need a far longer timeout than API calls.
#[derive(Clone, Debug)]
pub struct DirectUploader {
    client: Client,
    timeout: Duration,
    chunk_size: usize,
}

impl DirectUploader {
    pub fn new(timeout: Duration) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransferError::transport("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            timeout,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn from_config(config: &ClientConfig) -> TransferResult<Self> {
        Self::new(config.transfer_timeout)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Multipart POST: ticket fields in order, the artifact last.
    async fn form_request(
        &self,
        ticket: FormFieldTicket,
        artifact: &Artifact,
        progress: &TransferProgress,
    ) -> TransferResult<RequestBuilder> {
        let stream = artifact_stream(artifact, self.chunk_size, progress.clone()).await?;

        let mut form = Form::new();
        for (name, value) in ticket.fields {
            form = form.text(name, value);
        }

        let part = Part::stream_with_length(Body::wrap_stream(stream), artifact.size)
            .file_name(artifact.name.clone())
            .mime_str(&artifact.content_type)
            .map_err(|_| {
                TransferError::InvalidArtifact(format!(
                    "Invalid content type: {}",
                    artifact.content_type
                ))
            })?;
        form = form.part(FILE_FIELD, part);

        Ok(self.client.post(&ticket.target).multipart(form))
    }

    /// Raw PUT with the artifact's content type and the ticket's headers.
    async fn direct_request(
        &self,
        ticket: DirectTicket,
        artifact: &Artifact,
        progress: &TransferProgress,
    ) -> TransferResult<RequestBuilder> {
        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&artifact.content_type).map_err(|_| {
            TransferError::InvalidArtifact(format!(
                "Invalid content type: {}",
                artifact.content_type
            ))
        })?;
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(artifact.size));

        // Signed headers from the ticket win over our defaults
        for (name, value) in &ticket.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransferError::InvalidTicket(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                TransferError::InvalidTicket(format!("Invalid value for header {}", name.as_str()))
            })?;
            headers.insert(name, value);
        }

        let stream = artifact_stream(artifact, self.chunk_size, progress.clone()).await?;
        Ok(self
            .client
            .put(&ticket.target)
            .headers(headers)
            .body(Body::wrap_stream(stream)))
    }

    async fn send(&self, request: RequestBuilder) -> TransferResult<()> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransferError::Timeout {
                    after: self.timeout,
                    source: e,
                }
            } else {
                TransferError::transport("Failed to send artifact", e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("No error details")
                    .to_string()
            } else {
                body.chars().take(512).collect()
            };
            return Err(TransferError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ArtifactTransfer for DirectUploader {
    async fn transfer(
        &self,
        ticket: TransferTicket,
        artifact: &Artifact,
        progress: &TransferProgress,
    ) -> TransferResult<()> {
        if let Some(expires_at) = ticket.expires_at() {
            if expires_at <= Utc::now() {
                return Err(TransferError::TicketExpired(expires_at));
            }
        }

        let job_id = ticket.job_id();
        let shape = ticket.shape();
        let start = Instant::now();

        tracing::info!(
            job_id = %job_id,
            shape = %shape,
            filename = %artifact.name,
            size_bytes = artifact.size,
            "Starting direct transfer"
        );

        let request = match ticket {
            TransferTicket::FormField(ticket) => {
                self.form_request(ticket, artifact, progress).await?
            }
            TransferTicket::Direct(ticket) => {
                self.direct_request(ticket, artifact, progress).await?
            }
        };

        if let Err(e) = self.send(request).await {
            tracing::error!(
                error = %e,
                job_id = %job_id,
                shape = %shape,
                size_bytes = artifact.size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Direct transfer failed"
            );
            return Err(e);
        }

        progress.complete();

        tracing::info!(
            job_id = %job_id,
            shape = %shape,
            size_bytes = artifact.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Direct transfer successful"
        );

        Ok(())
    }
}
