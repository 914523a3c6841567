//! Bounded exponential backoff around a single logical request.
//!
//! [`Retrier::run`] executes an attempt under a per-attempt deadline and
//! retries failures that [`ApiError::is_retryable`] accepts. The wait starts
//! at `initial_wait`, doubles after every retry and is capped at `max_wait`.
//! Cancellation is checked before each attempt and during each wait; an
//! attempt already in flight is never interrupted.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ApiError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_WAIT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1).
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_wait: Duration,
    /// Upper bound for any single wait.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_wait: DEFAULT_INITIAL_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl RetryPolicy {
    /// Replaces zero values with the defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: if self.max_attempts == 0 {
                defaults.max_attempts
            } else {
                self.max_attempts
            },
            initial_wait: if self.initial_wait.is_zero() {
                defaults.initial_wait
            } else {
                self.initial_wait
            },
            max_wait: if self.max_wait.is_zero() {
                defaults.max_wait
            } else {
                self.max_wait
            },
        }
    }

    /// Wait before retry number `retry` (0-indexed).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }
}

/// Runs attempts according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    attempt_timeout: Duration,
    cancel: CancellationToken,
}

impl Retrier {
    pub fn new(policy: RetryPolicy, attempt_timeout: Duration, cancel: CancellationToken) -> Self {
        let attempt_timeout = if attempt_timeout.is_zero() {
            DEFAULT_ATTEMPT_TIMEOUT
        } else {
            attempt_timeout
        };
        Self {
            policy: policy.normalized(),
            attempt_timeout,
            cancel,
        }
    }

    /// Runs `attempt` until it succeeds, fails terminally, runs out of
    /// attempts or the run is cancelled.
    ///
    /// Exhaustion yields [`ApiError::RetriesExhausted`] wrapping the last
    /// error; cancellation yields [`ApiError::Cancelled`].
    pub async fn run<T, F, Fut>(&self, target: &str, mut attempt: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut number = 1;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }

            let err = match timeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => {
                    if number > 1 {
                        debug!(url = %target, attempt = number, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(err)) => err,
                Err(_) => ApiError::Timeout,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if number >= self.policy.max_attempts {
                return Err(ApiError::RetriesExhausted {
                    attempts: number,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.backoff(number - 1);
            debug!(
                url = %target,
                attempt = number + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying request"
            );

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                () = sleep(delay) => {}
            }
            number += 1;
        }
    }
}
