use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::BackoffConfig;

/// Non-standard header carrying the epoch second at which the rate limit resets.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Source of uniform random numbers in `[0, 1)`.
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;
/// Source of the current wall-clock time.
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync>;

/// Computes how long to wait before the next retry.
///
/// Server hints win over local policy:
/// 1. `Retry-After` (seconds or HTTP date), used as-is.
/// 2. `X-RateLimit-Reset` (epoch seconds), stretched by positive jitter only.
/// 3. Exponential backoff with symmetric jitter.
///
/// Every returned delay lies in `[0, max_delay_ms]`.
#[derive(Clone)]
pub struct Backoff {
    config: BackoffConfig,
    rng: RandomSource,
    clock: Clock,
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            rng: Arc::new(rand::random::<f64>),
            clock: Arc::new(SystemTime::now),
        }
    }

    /// Replaces the jitter source, e.g. with a fixed value in tests.
    pub fn with_rng(mut self, rng: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        self.rng = Arc::new(rng);
        self
    }

    /// Replaces the clock used to resolve absolute header timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Exponential delay for `attempt` before jitter: `min(initial × 2^attempt, max)`.
    pub fn exponential_delay(&self, attempt: usize) -> Duration {
        let exp = attempt.min(32) as u32;
        let delay_ms = self
            .config
            .initial_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.config.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Delay to wait before retrying after a response carrying `headers`.
    pub fn compute_delay(&self, headers: &HeaderMap, attempt: usize) -> Duration {
        let now = (self.clock)();
        let now_ms = epoch_ms(now);

        if let Some(delay_ms) = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_retry_after(value, now))
        {
            return self.clamp(delay_ms as f64);
        }

        if let Some(diff_ms) = headers
            .get(RATE_LIMIT_RESET)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|reset_secs| {
                i64::try_from(reset_secs.saturating_mul(1_000))
                    .unwrap_or(i64::MAX)
                    .saturating_sub(now_ms)
            })
            .filter(|diff_ms| *diff_ms > 0)
        {
            let base = (diff_ms as u64).min(self.config.max_delay_ms) as f64;
            return self.clamp(base * (1.0 + self.random() * self.config.jitter_factor));
        }

        let base = self.exponential_delay(attempt).as_millis() as f64;
        self.clamp(base * (1.0 + (self.random() - 0.5) * self.config.jitter_factor))
    }

    fn random(&self) -> f64 {
        let value = (self.rng)();
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    fn clamp(&self, delay_ms: f64) -> Duration {
        let max = self.config.max_delay_ms as f64;
        if !delay_ms.is_finite() {
            return Duration::from_millis(self.config.max_delay_ms);
        }
        Duration::from_millis(delay_ms.clamp(0.0, max).round() as u64)
    }
}

fn epoch_ms(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|since_epoch| i64::try_from(since_epoch.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Resolves a `Retry-After` value to milliseconds from `now`.
///
/// Delta-seconds count only when positive. Any of the three HTTP-date forms is
/// accepted; a date already passed means no wait. Returns `None` otherwise, so
/// the caller falls back to the next strategy.
fn parse_retry_after(value: &str, now: SystemTime) -> Option<u64> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return (seconds > 0).then_some(seconds.saturating_mul(1_000));
    }

    let target = httpdate::parse_http_date(value).ok()?;
    let diff = target.duration_since(now).unwrap_or(Duration::ZERO);
    Some(u64::try_from(diff.as_millis()).unwrap_or(u64::MAX))
}
