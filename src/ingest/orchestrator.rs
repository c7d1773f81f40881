//! Ingestion orchestrator
//!
//! One run fetches all four collections concurrently. Each kind that arrives
//! replaces its stored counterpart right away; kinds that fail keep whatever
//! the store held before. The run reports every failure, not just the first.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use crate::catalog::CatalogStore;
use crate::models::ResourceKind;
use crate::utils::error::FetchError;
use crate::utils::retry::RetryConfig;
use crate::utils::shutdown::Shutdown;

use super::fetcher::ResourceFetcher;
use super::task::{run_fetch_task, FetchOutcome};

/// A failed kind from one ingestion run
#[derive(Error, Debug)]
#[error("{error}")]
pub struct IngestError {
    pub kind: ResourceKind,
    #[source]
    pub error: FetchError,
}

/// Runs ingestion against a fetcher into a shared store
pub struct Ingestor {
    fetcher: Arc<dyn ResourceFetcher>,
    store: Arc<CatalogStore>,
    retry: RetryConfig,
    shutdown: Shutdown,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, store: Arc<CatalogStore>, retry: RetryConfig) -> Self {
        Self {
            fetcher,
            store,
            retry,
            shutdown: Shutdown::never(),
        }
    }

    /// Cancel in-flight fetches when `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Fetch every kind concurrently and replace what arrived
    ///
    /// Returns one error per failed kind, in completion order; an empty list
    /// means all four collections were replaced. Never panics on task
    /// failure: a task that dies is reported as [`FetchError::TaskAborted`].
    pub async fn initialize_data(&self) -> Vec<IngestError> {
        let started = Instant::now();

        let mut pending: FuturesUnordered<_> = ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let fetcher = Arc::clone(&self.fetcher);
                let retry = self.retry.clone();
                let shutdown = self.shutdown.clone();
                let handle = tokio::spawn(async move {
                    run_fetch_task(fetcher.as_ref(), kind, &retry, shutdown).await
                });
                async move { (kind, handle.await) }
            })
            .collect();

        let mut errors = Vec::new();

        while let Some((kind, joined)) = pending.next().await {
            match joined {
                Ok(FetchOutcome {
                    result: Ok(collection),
                    ..
                }) => {
                    tracing::debug!(kind = %kind, records = collection.len(), "Replacing collection");
                    self.store.replace(collection);
                }
                Ok(FetchOutcome {
                    result: Err(error), ..
                }) => errors.push(IngestError { kind, error }),
                Err(join_error) => {
                    tracing::error!(kind = %kind, error = %join_error, "Fetch task aborted");
                    errors.push(IngestError {
                        kind,
                        error: FetchError::TaskAborted {
                            operation: kind.operation(),
                            reason: join_error.to_string(),
                        },
                    });
                }
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if errors.is_empty() {
            tracing::info!(elapsed_ms = elapsed_ms, "Ingestion complete");
        } else {
            tracing::warn!(
                failed = errors.len(),
                elapsed_ms = elapsed_ms,
                "Ingestion finished with errors"
            );
        }

        errors
    }
}
