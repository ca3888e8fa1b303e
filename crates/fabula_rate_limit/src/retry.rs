//! Bounded exponential backoff for transient provider failures.

use crate::RetryConfig;
use fabula_error::RetryableError;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::warn;

/// Retry schedule applied to one provider call.
///
/// The first attempt runs immediately. Each transient failure is followed by
/// a sleep of `initial_backoff * multiplier^n` before the next attempt, for at
/// most `max_retries` additional attempts.
///
/// # Examples
///
/// ```
/// use fabula_rate_limit::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// let delays: Vec<Duration> = policy.delays().collect();
/// assert_eq!(delays, vec![Duration::from_secs(1), Duration::from_secs(2)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.multiplier.max(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry count and first delay, doubling each time.
    pub fn new(max_retries: usize, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            multiplier: 2,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The sleeps taken between attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let initial = self.initial_backoff;
        let multiplier = self.multiplier;
        (0..self.max_retries)
            .map(move |n| initial.saturating_mul(multiplier.saturating_pow(n as u32)))
    }

    /// Run `operation`, retrying transient failures according to this policy.
    ///
    /// Permanent failures are returned immediately. When retries are
    /// exhausted the last transient error is returned.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let text = policy.execute(|| async { provider.complete_chat(&request).await }).await?;
    /// ```
    pub async fn execute<F, Fut, R, E>(&self, operation: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: RetryableError + std::fmt::Display,
    {
        Retry::spawn(self.delays(), || async {
            match operation().await {
                Ok(value) => Ok(value),
                Err(e) => {
                    if e.is_retryable() {
                        warn!("Transient error, will retry: {}", e);
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    } else {
                        warn!("Permanent error, failing immediately: {}", e);
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}
