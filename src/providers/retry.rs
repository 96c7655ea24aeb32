// Retry logic with randomized exponential backoff

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::types::ProviderError;
use crate::config::RetryConfig;

/// How often, and how patiently, a failed request is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Random wait before retry number `retry` (0-based): uniform between
    /// `min_delay` and `min(max_delay, min_delay * 2^retry)`.
    pub fn delay_for(&self, retry: u32, rng: &mut impl Rng) -> Duration {
        let low = self.min_delay.min(self.max_delay);
        let high = self
            .min_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_delay);
        if high <= low {
            return low;
        }
        let millis = rng.gen_range(low.as_millis() as u64..=high.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the policy
/// runs out of attempts. The last error is returned.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if attempt >= max_attempts || !error.is_retryable() {
            return Err(error);
        }

        let mut delay = policy.delay_for(attempt - 1, &mut rand::thread_rng());
        if let Some(floor) = error.retry_after() {
            delay = delay.max(floor);
        }
        tracing::warn!(
            "Request failed (attempt {}/{}): {}; retrying in {:?}",
            attempt,
            max_attempts,
            error,
            delay
        );
        sleep(delay).await;
    }
}
