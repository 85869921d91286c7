//! Retry logic and backoff strategies for notification providers
//!
//! Sends that fail with a transient transport error are retried with
//! exponential backoff, up to a fixed number of attempts. The helper reports
//! how many attempts were made so callers can surface the retry count.

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            exponential_base: 2.0,
            jitter: true,
        }
    }

    /// Create a config with no retries (fire-and-forget)
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            exponential_base: 1.0,
            jitter: false,
        }
    }

    /// Disable randomization, mostly useful for deterministic tests
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Convert to exponential backoff configuration
    fn to_exponential_backoff(&self) -> ExponentialBackoff {
        let initial = Duration::from_millis(self.initial_delay_ms);
        let mut backoff = ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            max_interval: Duration::from_millis(self.max_delay_ms),
            multiplier: self.exponential_base,
            max_elapsed_time: None,
            ..Default::default()
        };

        if !self.jitter {
            backoff.randomization_factor = 0.0;
        }

        backoff
    }
}

/// Trait to determine if an error is retryable
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;

    /// Delay requested by the remote side (e.g. a `Retry-After` header)
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Final result of a retried operation plus the number of attempts spent
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    /// Attempts beyond the first one
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Retry an async operation with exponential backoff.
///
/// `operation` receives the 1-based attempt number. Non-retryable errors end
/// the loop immediately. When a `deadline` is given, no new attempt is started
/// if its backoff delay would run past it.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    deadline: Option<Instant>,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug + IsRetryable,
{
    let max_attempts = config.max_attempts.max(1);
    let mut backoff = config.to_exponential_backoff();
    let max_delay = Duration::from_millis(config.max_delay_ms);
    let mut attempt = 1;

    loop {
        debug!("Retry attempt {} of {}", attempt, max_attempts);

        let error = match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation succeeded after {} attempts", attempt);
                }
                return RetryOutcome {
                    result: Ok(result),
                    attempts: attempt,
                };
            }
            Err(error) => error,
        };

        if attempt >= max_attempts || !error.is_retryable() {
            warn!(
                "Operation failed after {} attempts, error: {:?}",
                attempt, error
            );
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
            };
        }

        let Some(computed) = backoff.next_backoff() else {
            warn!("Backoff exhausted after {} attempts", attempt);
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
            };
        };
        let delay = error
            .retry_after()
            .map(|hint| hint.min(max_delay))
            .unwrap_or(computed);

        if let Some(deadline) = deadline {
            if Instant::now() + delay >= deadline {
                warn!(
                    "Deadline reached before attempt {}, giving up. Error: {:?}",
                    attempt + 1,
                    error
                );
                return RetryOutcome {
                    result: Err(error),
                    attempts: attempt,
                };
            }
        }

        warn!(
            "Operation failed (attempt {}/{}), retrying in {:?}. Error: {:?}",
            attempt, max_attempts, delay, error
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    #[tokio::test]
    async fn test_retry_success_after_failure() {
        let config = RetryConfig::new(3, 10, 1000); // Fast retry for testing
        let attempt_count = Arc::new(AtomicU32::new(0));

        let outcome = retry_with_backoff(&config, None, |_| {
            let count = attempt_count.clone();
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                if current < 3 {
                    Err(TestError { retryable: true })
                } else {
                    Ok(current)
                }
            }
        })
        .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retries(), 2);
        assert_eq!(outcome.result.unwrap(), 3);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_failure_not_retryable() {
        let config = RetryConfig::new(3, 10, 1000);
        let attempt_count = Arc::new(AtomicU32::new(0));

        let outcome: RetryOutcome<(), TestError> = retry_with_backoff(&config, None, |_| {
            let count = attempt_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err(TestError { retryable: false })
            }
        })
        .await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 1); // Only one attempt
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_stops_at_max_attempts() {
        let config = RetryConfig::new(3, 5, 20).without_jitter();

        let outcome: RetryOutcome<(), TestError> =
            retry_with_backoff(&config, None, |_| async { Err(TestError { retryable: true }) })
                .await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_respects_deadline() {
        let config = RetryConfig::new(5, 200, 1000).without_jitter();
        let deadline = Instant::now() + Duration::from_millis(50);

        let outcome: RetryOutcome<(), TestError> = retry_with_backoff(
            &config,
            Some(deadline),
            |_| async { Err(TestError { retryable: true }) },
        )
        .await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn test_no_retry_runs_once() {
        let config = RetryConfig::no_retry();
        let outcome: RetryOutcome<(), TestError> = tokio_test::block_on(retry_with_backoff(
            &config,
            None,
            |_| async { Err(TestError { retryable: true }) },
        ));
        assert_eq!(outcome.attempts, 1);
    }
}
