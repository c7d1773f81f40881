//! Retrying fetch task for one resource kind

use crate::models::{Collection, ResourceKind};
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry, RetryConfig, RetryError};
use crate::utils::shutdown::Shutdown;

use super::fetcher::ResourceFetcher;

/// What a fetch task reports back to the orchestrator
#[derive(Debug)]
pub struct FetchOutcome {
    pub kind: ResourceKind,
    pub result: Result<Collection, FetchError>,

    /// Attempts started, including the one that succeeded or was cancelled
    pub attempts: u32,
}

/// Fetch one collection, retrying with a fixed backoff
///
/// Every attempt gets its own deadline. A failed attempt, timeouts included,
/// is followed by one backoff sleep unless it was the last. Shutdown aborts
/// immediately with [`FetchError::Cancelled`].
pub async fn run_fetch_task(
    fetcher: &dyn ResourceFetcher,
    kind: ResourceKind,
    retry: &RetryConfig,
    mut shutdown: Shutdown,
) -> FetchOutcome {
    let operation = kind.operation();

    let outcome = with_retry(retry, &mut shutdown, |attempt, deadline| {
        tracing::debug!(kind = %kind, attempt = attempt, "Starting fetch attempt");
        fetcher.fetch(kind, deadline)
    })
    .await;

    match outcome {
        Ok(retried) => {
            tracing::info!(
                kind = %kind,
                records = retried.value.len(),
                attempts = retried.attempts,
                "Fetched collection"
            );
            FetchOutcome {
                kind,
                result: Ok(retried.value),
                attempts: retried.attempts,
            }
        }
        Err(RetryError::Exhausted { attempts, last }) => {
            tracing::error!(
                kind = %kind,
                attempts = attempts,
                network = last.is_network(),
                error = %last,
                "Fetch gave up"
            );
            FetchOutcome {
                kind,
                result: Err(FetchError::RetryExhausted {
                    operation,
                    attempts,
                    source: Box::new(last),
                }),
                attempts,
            }
        }
        Err(RetryError::Cancelled { attempt }) => {
            tracing::info!(kind = %kind, attempt = attempt, "Fetch cancelled by shutdown");
            FetchOutcome {
                kind,
                result: Err(FetchError::Cancelled { operation, attempt }),
                attempts: attempt,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artist;
    use crate::utils::shutdown;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Fails the first `failures` calls, then returns an empty collection
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ResourceFetcher for Flaky {
        async fn fetch(&self, kind: ResourceKind, _deadline: Instant) -> Result<Collection, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(FetchError::Status(500));
            }
            Ok(match kind {
                ResourceKind::Artists => Collection::Artists(vec![Artist::default()]),
                ResourceKind::Locations => Collection::Locations(Vec::new()),
                ResourceKind::Dates => Collection::Dates(Vec::new()),
                ResourceKind::Relations => Collection::Relations(Vec::new()),
            })
        }
    }

    /// Connection refused on the first `drops` calls, then one artist
    struct Unreachable {
        drops: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ResourceFetcher for Unreachable {
        async fn fetch(&self, kind: ResourceKind, _deadline: Instant) -> Result<Collection, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.drops {
                return Err(FetchError::Network {
                    url: format!("http://127.0.0.1:1{}", kind.default_path()),
                    reason: String::from("connection refused"),
                });
            }
            Ok(Collection::Artists(vec![Artist::default()]))
        }
    }

    /// Never answers; only the deadline ends an attempt
    struct Hanging;

    #[async_trait]
    impl ResourceFetcher for Hanging {
        async fn fetch(&self, _kind: ResourceKind, deadline: Instant) -> Result<Collection, FetchError> {
            tokio::time::sleep_until(deadline).await;
            Err(FetchError::Timeout(Duration::from_secs(5)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_kth_attempt_sleeps_k_minus_one_backoffs() {
        for kind in ResourceKind::ALL {
            for k in 1..=3u32 {
                let fetcher = Flaky::new(k - 1);
                let start = Instant::now();

                let outcome =
                    run_fetch_task(&fetcher, kind, &RetryConfig::default(), Shutdown::never()).await;

                assert!(outcome.result.is_ok(), "{kind} attempt {k}");
                assert_eq!(outcome.attempts, k);
                assert_eq!(outcome.kind, kind);
                assert_eq!(start.elapsed(), Duration::from_secs(u64::from(k - 1)));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_exhaust_with_two_backoffs() {
        for kind in ResourceKind::ALL {
            let fetcher = Flaky::new(u32::MAX);
            let start = Instant::now();

            let outcome =
                run_fetch_task(&fetcher, kind, &RetryConfig::default(), Shutdown::never()).await;

            assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
            assert_eq!(start.elapsed(), Duration::from_secs(2));

            let err = outcome.result.unwrap_err();
            let msg = err.to_string();
            assert!(msg.starts_with(&format!("{} failed after 3 attempts", kind.operation())));
            assert!(msg.contains("500"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried() {
        let start = Instant::now();
        let outcome = run_fetch_task(
            &Hanging,
            ResourceKind::Dates,
            &RetryConfig::default(),
            Shutdown::never(),
        )
        .await;

        // three 5s deadlines plus two 1s backoffs
        assert_eq!(start.elapsed(), Duration::from_secs(17));
        assert!(matches!(
            outcome.result,
            Err(FetchError::RetryExhausted { attempts: 3, .. })
        ));
        assert!(outcome.result.unwrap_err().last_attempt().is_network());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_then_success_on_third_attempt() {
        let fetcher = Unreachable {
            drops: 2,
            calls: AtomicU32::new(0),
        };
        let start = Instant::now();

        let outcome = run_fetch_task(
            &fetcher,
            ResourceKind::Artists,
            &RetryConfig::default(),
            Shutdown::never(),
        )
        .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(outcome.result.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_attempt() {
        let (handle, rx) = shutdown::channel();

        let task = tokio::spawn(async move {
            run_fetch_task(&Hanging, ResourceKind::Relations, &RetryConfig::default(), rx).await
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.trigger();

        let started = Instant::now();
        let outcome = task.await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(matches!(
            outcome.result,
            Err(FetchError::Cancelled {
                operation: "FetchRelations",
                attempt: 1
            })
        ));
    }
}
