use crate::api::{ClientError, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.rustfile.cloud";

/// Backoff schedule for retryable request failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the second attempt (default: 1s)
    pub initial_delay: Duration,

    /// Growth factor applied per attempt (default: 2.0)
    pub backoff_multiplier: f64,

    /// Upper bound for any single delay (default: 10s)
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// `min(initial_delay * multiplier^attempt, max_delay)`, with `attempt` zero-based.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Budget for waiting on server-side processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Wall-clock budget for the whole wait (default: 60s)
    pub max_wait: Duration,

    /// Pause between status reads (default: 1s)
    pub poll_interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(60_000),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// Client configuration. Read-only once a client has been built from it.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,

    /// Service address, without trailing slash
    pub base_url: String,

    /// Timeout applied to each individual attempt (default: 30s)
    pub timeout: Duration,

    /// Attempts per logical request, including the first (default: 3)
    pub max_retries: u32,

    pub retry: RetryPolicy,

    pub poll: PollOptions,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry", &self.retry)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::configuration("API key is required"));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(30_000),
            max_retries: 3,
            retry: RetryPolicy::default(),
            poll: PollOptions::default(),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("RUSTFILE_API_KEY").unwrap_or_default();
        let mut config = Self::new(api_key)?;

        if let Ok(base_url) = env::var("RUSTFILE_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }

        if let Some(timeout_ms) = env::var("RUSTFILE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = Duration::from_millis(timeout_ms);
        }

        if let Some(max_retries) = env::var("RUSTFILE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config = config.with_max_retries(max_retries);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            ClientError::configuration(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::configuration(format!(
                "Unsupported base URL scheme '{}'",
                parsed.scheme()
            )));
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// At least one attempt is always made.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Joins a service-relative path (leading `/`) onto the base address.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
