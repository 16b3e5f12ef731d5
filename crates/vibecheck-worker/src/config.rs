use std::time::Duration;
use vibecheck_core::ClientConfig;

#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Time between the starts of consecutive status fetches.
    pub interval: Duration,
    /// End the session after this many fetches without a terminal status.
    pub max_attempts: Option<u32>,
    /// End the session once this much time has passed since it started.
    pub max_elapsed: Option<Duration>,
    /// A fetch taking longer than this counts as a transient failure.
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: Some(360),
            max_elapsed: Some(Duration::from_secs(30 * 60)),
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

impl From<&ClientConfig> for PollerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
            max_elapsed: config.poll_max_elapsed,
            fetch_timeout: config.poll_fetch_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_client_config() {
        let from_client = PollerConfig::from(&ClientConfig::default());
        let default = PollerConfig::default();
        assert_eq!(from_client.interval, default.interval);
        assert_eq!(from_client.max_attempts, default.max_attempts);
        assert_eq!(from_client.max_elapsed, default.max_elapsed);
        assert_eq!(from_client.fetch_timeout, default.fetch_timeout);
    }
}
