use std::time::Duration;

use url::Url;

use crate::{execution::PollPolicy, transport::RetryPolicy, AsterixError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:19002";

/// Connection settings.
///
/// - `timeout` bounds each HTTP exchange.
/// - `max_retries` and `retry_delay` drive the backoff on connection faults.
/// - `max_async_attempts` and `async_check_interval` are the poll policy used
///   when an async execution is asked to block without one of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_async_attempts: u32,
    pub async_check_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            max_async_attempts: 100,
            async_check_interval: Duration::from_millis(500),
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(base_url: &str) -> Self {
        Self { base_url: base_url.to_string(), ..Self::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_async_polling(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.max_async_attempts = max_attempts;
        self.async_check_interval = interval;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_async_attempts, self.async_check_interval)
    }

    /// The base URL parsed; trailing slashes are dropped.
    pub fn parse_base_url(&self) -> Result<Url, AsterixError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed)
            .map_err(|e| AsterixError::validation(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AsterixError::validation(format!("Unsupported URL scheme '{}'", url.scheme())));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ConnectionConfig;

    #[test]
    pub fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.base_url, "http://localhost:19002");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_policy().max_retries, 3);
        assert_eq!(config.retry_policy().initial_delay, Duration::from_millis(100));
        assert_eq!(config.poll_policy().max_attempts, 100);
        assert_eq!(config.poll_policy().interval, Duration::from_millis(500));
    }

    #[test]
    pub fn test_base_url() {
        let url = ConnectionConfig::from("http://db.local:19002/").parse_base_url().unwrap();
        assert_eq!(url.as_str(), "http://db.local:19002/");
        assert!(ConnectionConfig::from("not a url").parse_base_url().is_err());
        assert!(ConnectionConfig::from("ftp://db.local").parse_base_url().is_err());
    }
}
