use std::time::Duration;

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Delay calculation between retries.
    pub backoff: BackoffConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 2,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Tuning for [`crate::Backoff`].
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry, before jitter.
    pub initial_delay_ms: u64,
    /// Upper bound for every computed delay.
    pub max_delay_ms: u64,
    /// Relative jitter width. `0.2` means ±10% on exponential delays.
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
        }
    }
}

/// Controls how long and how often a run is polled for completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOptions {
    /// Total client-side wait budget.
    pub timeout: Duration,
    /// Sleep between two consecutive status fetches.
    pub poll_interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1_800),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl PollOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
