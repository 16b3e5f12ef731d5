//! Configuration module
//!
//! Client configuration loaded from the environment (and `.env`): where the
//! orchestrating service lives, request and transfer timeouts, and the polling
//! cadence and ceilings for job status sessions.

use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_API_PREFIX: &str = "/api/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TRANSFER_TIMEOUT_SECS: u64 = 3600;
const POLL_INTERVAL_SECS: u64 = 5;
const POLL_MAX_ATTEMPTS: u32 = 360;
const POLL_MAX_ELAPSED_SECS: u64 = 1800;
const POLL_FETCH_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_prefix: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub transfer_timeout: Duration,
    pub poll_interval: Duration,
    /// `None` disables the attempt ceiling.
    pub poll_max_attempts: Option<u32>,
    /// `None` disables the elapsed-time ceiling.
    pub poll_max_elapsed: Option<Duration>,
    pub poll_fetch_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            transfer_timeout: Duration::from_secs(TRANSFER_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            poll_max_attempts: Some(POLL_MAX_ATTEMPTS),
            poll_max_elapsed: Some(Duration::from_secs(POLL_MAX_ELAPSED_SECS)),
            poll_fetch_timeout: Duration::from_secs(POLL_FETCH_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        // 0 disables a ceiling
        let ceiling = |value: u64| (value > 0).then_some(value);

        let config = Self {
            api_url: var("VIBECHECK_API_URL")
                .or_else(|| var("API_URL"))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_prefix: var("VIBECHECK_API_PREFIX")
                .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_token: var("VIBECHECK_API_TOKEN").or_else(|| var("API_TOKEN")),
            request_timeout: Duration::from_secs(secs(
                "VIBECHECK_REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )),
            transfer_timeout: Duration::from_secs(secs(
                "VIBECHECK_TRANSFER_TIMEOUT_SECS",
                TRANSFER_TIMEOUT_SECS,
            )),
            poll_interval: Duration::from_secs(secs(
                "VIBECHECK_POLL_INTERVAL_SECS",
                POLL_INTERVAL_SECS,
            )),
            poll_max_attempts: ceiling(secs(
                "VIBECHECK_POLL_MAX_ATTEMPTS",
                POLL_MAX_ATTEMPTS as u64,
            ))
            .map(|n| n.min(u32::MAX as u64) as u32),
            poll_max_elapsed: ceiling(secs(
                "VIBECHECK_POLL_MAX_ELAPSED_SECS",
                POLL_MAX_ELAPSED_SECS,
            ))
            .map(Duration::from_secs),
            poll_fetch_timeout: Duration::from_secs(secs(
                "VIBECHECK_POLL_FETCH_TIMEOUT_SECS",
                POLL_FETCH_TIMEOUT_SECS,
            )),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "VIBECHECK_API_URL must be an http(s) URL, got {}",
                self.api_url
            ));
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(anyhow::anyhow!(
                "VIBECHECK_API_PREFIX must start with '/', got {}",
                self.api_prefix
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "VIBECHECK_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.transfer_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "VIBECHECK_TRANSFER_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "VIBECHECK_POLL_INTERVAL_SECS must be greater than zero"
            ));
        }

        if self.poll_fetch_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "VIBECHECK_POLL_FETCH_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ClientConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.poll_max_attempts, Some(360));
        assert_eq!(config.poll_max_elapsed, Some(Duration::from_secs(1800)));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn overrides_and_fallback_names() {
        let config = config_from(&[
            ("API_URL", "https://api.example.com/"),
            ("API_TOKEN", "tok"),
            ("VIBECHECK_POLL_INTERVAL_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn zero_disables_ceilings() {
        let config = config_from(&[
            ("VIBECHECK_POLL_MAX_ATTEMPTS", "0"),
            ("VIBECHECK_POLL_MAX_ELAPSED_SECS", "0"),
        ])
        .unwrap();
        assert!(config.poll_max_attempts.is_none());
        assert!(config.poll_max_elapsed.is_none());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = config_from(&[("VIBECHECK_POLL_INTERVAL_SECS", "0")]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        assert!(config_from(&[("VIBECHECK_REQUEST_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("VIBECHECK_TRANSFER_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("VIBECHECK_POLL_FETCH_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn non_http_url_is_rejected() {
        let result = config_from(&[("VIBECHECK_API_URL", "ftp://example.com")]);
        assert!(result.is_err());
    }

    #[test]
    fn garbage_numbers_fall_back_to_defaults() {
        let config = config_from(&[("VIBECHECK_REQUEST_TIMEOUT_SECS", "soon")]).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
