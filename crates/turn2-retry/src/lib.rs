//! Retry policy and exponential backoff with jitter.
//!
//! Two call sites use this: the Context Loader (per-object S3 retries,
//! §4.2) and the Record Updater (per-update DynamoDB retries, §4.8). Both
//! configure a [`RetryPolicy`] and drive it with [`RetryPolicy::run`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use std::time::Duration;

/// Wall-clock timeout applied to a single attempt, distinct from the
/// retry policy's own attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Per-attempt deadline.
    pub per_attempt: Duration,
}

impl TimeoutConfig {
    /// Build a timeout config from seconds.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self {
            per_attempt: Duration::from_secs(secs),
        }
    }
}

/// Exponential backoff with jitter, per-object or per-update (§4.2, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Start building a policy with the given maximum attempt count
    /// (attempts, not retries — `max_attempts = 1` means no retry).
    #[must_use]
    pub fn builder(max_attempts: u32) -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }

    /// Maximum number of attempts (including the first).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the `attempt`-th retry (1-indexed: the delay before
    /// the second attempt is `delay_for(1)`), exponential with jitter,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_millis().saturating_mul(1u128 << attempt.min(20));
        let capped = exp.min(self.max_delay.as_millis());
        let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
        Duration::from_millis(jittered as u64)
    }

    /// Run `op` up to `max_attempts` times, retrying only when `is_retryable`
    /// returns `true` for the error, sleeping [`RetryPolicy::delay_for`]
    /// between attempts. Returns the last error if all attempts are
    /// exhausted.
    pub async fn run<T, E, F, Fut>(
        &self,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !is_retryable(&e) {
                        return Err(e);
                    }
                    tokio::time::sleep(self.delay_for(attempt)).await;
                }
            }
        }
    }
}

/// Fluent builder for [`RetryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicyBuilder {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicyBuilder {
    /// Set the base delay (delay before the first retry, before jitter).
    #[must_use]
    pub fn base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = d;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
        }
    }
}
