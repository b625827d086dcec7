//! Retry policy, predicates, and the attempt loop.
//!
//! A logical call is made of up to `retries + 1` attempts, run strictly one
//! after another. After a failed attempt the loop asks the configured
//! [`RetryPredicate`] whether to go again, waits the configured delay, and
//! starts the next attempt. A zero delay turns retries off. When attempts run
//! out the last failure is returned to the caller as is.
//!
//! Only failures of the exchange itself ([`Error::is_retryable`]) are ever
//! retried. Missing path parameters, serialization problems and validation
//! failures surface immediately no matter what the predicate says.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: usize = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// How many times to retry and how long to wait in between.
///
/// # Examples
///
/// ```
/// use apiwire::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(2, Duration::from_millis(250));
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(250)));
/// assert_eq!(policy.delay_for_attempt(3), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: usize,
    /// Delay before each retry. Zero disables retries.
    pub retry_delay: Duration,
    /// Scale each delay by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a fixed delay and no jitter.
    pub fn new(retries: usize, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
            jitter: false,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total number of attempts a call may make.
    pub fn max_attempts(&self) -> usize {
        if self.retry_delay.is_zero() {
            1
        } else {
            self.retries.saturating_add(1)
        }
    }

    /// Returns the delay before retrying after failed attempt `attempt`
    /// (1-indexed), or `None` if no retries are left.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        if attempt > self.retries || self.retry_delay.is_zero() {
            return None;
        }
        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.0);
            Some(self.retry_delay.mul_f64(factor))
        } else {
            Some(self.retry_delay)
        }
    }
}

/// Decides whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use apiwire::{Error, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error, Error::HttpError { status, .. } if status.as_u16() == 429)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` to retry after `error` on attempt `attempt` (1-indexed).
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry every exchange failure: network errors, timeouts, cancellations and
/// all non-2xx statuses, 4xx included.
///
/// This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryOnFailure;

impl RetryPredicate for RetryOnFailure {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only transient failures: network errors, timeouts, 429 and 5xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryOnTransient;

impl RetryPredicate for RetryOnTransient {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_transient()
    }
}

/// Runs `attempt_fn` until it succeeds or the policy gives up.
///
/// `attempt_fn` receives the 1-indexed attempt number and must build
/// everything attempt-scoped (cancellation signal, headers, form) itself.
/// Returns the value together with the number of attempts made.
///
/// The delay between attempts is skipped once `external` has fired, so an
/// already-cancelled call runs through its remaining attempts without
/// sleeping.
pub async fn execute<T, F, Fut>(
    policy: &RetryPolicy,
    predicate: &dyn RetryPredicate,
    external: Option<&CancellationToken>,
    mut attempt_fn: F,
) -> Result<(T, usize)>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match attempt_fn(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(e) => e,
        };

        tracing::warn!(error = %error, attempt = attempt, "Attempt failed");

        if !error.is_retryable() || !predicate.should_retry(&error, attempt) {
            return Err(error);
        }

        let Some(delay) = policy.delay_for_attempt(attempt) else {
            return Err(error);
        };

        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = attempt,
            "Retrying request after delay"
        );

        match external {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
}
