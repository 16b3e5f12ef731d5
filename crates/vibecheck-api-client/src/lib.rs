//! HTTP client for the VibeCheck orchestrating service.
//!
//! Provides a minimal client with generic GET/POST helpers and the gateway
//! implementations (ticket, confirm, jobs, analysis, interviewers). There is no
//! ambient auth: every request takes an explicit [`Credential`].

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vibecheck_core::{ClientConfig, Credential, GatewayError};

/// HTTP client for the orchestrating service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: String, api_prefix: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            config.api_prefix.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/jobs/{id}`.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn apply_credential(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        match credential.header() {
            Some((name, value)) => request.header(name, value),
            None => request,
        }
    }

    /// Send a request; connection failures and non-success statuses become `GatewayError`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout)
            } else {
                GatewayError::transport("Failed to send request", e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                detail: error_detail(&error_text),
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport("Failed to read response body", e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::Decode(format!("Failed to parse response as JSON: {}", e)))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let mut request = self.client.get(self.build_url(path));
        request = self.apply_credential(request, credential);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// GET request where 404 means "absent" rather than an error.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<Option<T>, GatewayError> {
        match self.get(credential, path, &[]).await {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        credential: &Credential,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let request = self.client.post(self.build_url(path)).json(body);
        let request = self.apply_credential(request, credential);

        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// POST JSON body, ignoring whatever the service answers on success.
    pub async fn post_json_no_content<B: serde::Serialize + ?Sized>(
        &self,
        credential: &Credential,
        path: &str,
        body: &B,
    ) -> Result<(), GatewayError> {
        let request = self.client.post(self.build_url(path)).json(body);
        let request = self.apply_credential(request, credential);

        self.send(request).await?;
        Ok(())
    }
}

/// Pull a readable message out of an error body (`{"detail": ...}` or `{"error": ...}`).
fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let detail = parsed.as_ref().and_then(|value| {
        ["detail", "error", "message"]
            .iter()
            .find_map(|key| match value.get(*key) {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
    });

    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => "No error details".to_string(),
        None => body.chars().take(512).collect(),
    }
}

// Re-export wire envelopes for convenience.
pub use api::{InterviewerListResponse, JobListResponse};
