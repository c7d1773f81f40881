//! Retry utilities for resilient operations
//!
//! Provides a bounded retry loop with a fixed backoff between attempts and a
//! fresh deadline per attempt. Both waits are raced against a [`Shutdown`]
//! signal so a stopping process never sits out a backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::shutdown::Shutdown;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,

    /// Deadline granted to each individual attempt
    pub attempt_timeout: Duration,

    /// Fixed delay between a failed attempt and the next one
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(5),
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with custom timing
    pub fn with_timing(max_retries: u32, attempt_timeout: Duration, backoff: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            backoff,
        }
    }

    /// Total number of attempts, never zero
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Successful value plus the attempt it arrived on (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// All attempts failed; carries the last error
    Exhausted { attempts: u32, last: E },

    /// Shutdown fired during the given attempt or the backoff before it
    Cancelled { attempt: u32 },
}

/// Execute an operation with a bounded number of attempts and a fixed backoff
///
/// `operation` receives the 1-based attempt number and the deadline for that
/// attempt; enforcing the deadline is the operation's job. Exactly
/// `attempts - 1` backoff sleeps happen, none after the final attempt.
///
/// # Example
///
/// ```no_run
/// use tourcat::utils::retry::{with_retry, RetryConfig};
/// use tourcat::utils::shutdown::Shutdown;
///
/// # async fn fetch_data() -> Result<String, std::io::Error> { Ok("data".into()) }
/// #[tokio::main]
/// async fn main() {
///     let config = RetryConfig::default();
///     let mut shutdown = Shutdown::never();
///     let result = with_retry(&config, &mut shutdown, |_attempt, _deadline| fetch_data()).await;
///     assert!(result.is_ok());
/// }
/// ```
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    shutdown: &mut Shutdown,
    mut operation: F,
) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut(u32, Instant) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let total = config.total_attempts();
    let mut attempt = 1;

    loop {
        let deadline = Instant::now() + config.attempt_timeout;

        let result = tokio::select! {
            biased;
            _ = shutdown.wait() => return Err(RetryError::Cancelled { attempt }),
            result = operation(attempt, deadline) => result,
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(Retried {
                    value,
                    attempts: attempt,
                });
            }
            Err(e) if attempt >= total => {
                warn!(attempt = attempt, total = total, error = %e, "Operation failed, giving up");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!(attempt = attempt, total = total, error = %e, "Operation failed, will retry");
            }
        }

        attempt += 1;
        debug!(
            attempt = attempt,
            delay_ms = config.backoff.as_millis() as u64,
            "Retrying operation after backoff"
        );

        tokio::select! {
            biased;
            _ = shutdown.wait() => return Err(RetryError::Cancelled { attempt }),
            _ = tokio::time::sleep(config.backoff) => {}
        }
    }
}
