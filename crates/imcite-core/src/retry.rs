//! Bounded retries with exponential backoff for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;

/// Retry behavior derived from [`RetryConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial one)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Backoff is capped here
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `op` until `should_retry` rejects its output or attempts run out.
///
/// The last output is returned as-is, so an exhausted retry surfaces the
/// final transient failure to the caller.
pub async fn retry_while<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
    should_retry: impl Fn(&T) -> bool,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    let mut attempt = 1;
    loop {
        let output = op().await;
        if attempt >= policy.max_attempts || !should_retry(&output) {
            if attempt > 1 {
                tracing::debug!(op = op_name, attempts = attempt, "retry loop finished");
            }
            return output;
        }

        let delay = policy.delay_for(attempt - 1);
        tracing::warn!(
            op = op_name,
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
