//! Refresh loop driving repeated ingestion runs

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::ingest::{IngestError, Ingestor, Status, StatusRegister};
use crate::utils::format_duration;
use crate::utils::shutdown::Shutdown;

/// Waits between ingestion runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    /// After a run with zero errors
    pub loaded_interval: Duration,

    /// After a run with at least one error
    pub failed_interval: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            loaded_interval: Duration::from_secs(24 * 60 * 60),
            failed_interval: Duration::from_secs(1),
        }
    }
}

impl RefreshIntervals {
    /// Wait before the next run; `None` while a run is in flight
    pub fn for_status(&self, status: Status) -> Option<Duration> {
        match status {
            Status::Loading => None,
            Status::Loaded => Some(self.loaded_interval),
            Status::Failed => Some(self.failed_interval),
        }
    }
}

/// Join handles returned by [`RefreshScheduler::launch`]
#[derive(Debug)]
pub struct LaunchHandles {
    /// First ingestion run, started immediately
    pub initial: JoinHandle<Vec<IngestError>>,

    /// Refresh loop; finishes once shutdown fires
    pub refresh_loop: JoinHandle<()>,
}

/// Owns the refresh cadence for one catalog
#[derive(Debug)]
pub struct RefreshScheduler {
    ingestor: Arc<Ingestor>,
    status: Arc<StatusRegister>,
    intervals: RefreshIntervals,
    last_completed: RwLock<Option<DateTime<Utc>>>,
}

impl RefreshScheduler {
    pub fn new(
        ingestor: Arc<Ingestor>,
        status: Arc<StatusRegister>,
        intervals: RefreshIntervals,
    ) -> Self {
        Self {
            ingestor,
            status,
            intervals,
            last_completed: RwLock::new(None),
        }
    }

    pub fn status(&self) -> &Arc<StatusRegister> {
        &self.status
    }

    pub fn ingestor(&self) -> &Arc<Ingestor> {
        &self.ingestor
    }

    pub fn intervals(&self) -> RefreshIntervals {
        self.intervals
    }

    /// When the last ingestion run finished, successful or not
    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        *self
            .last_completed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one refresh cycle: Loading, ingest, then Loaded or Failed
    pub async fn refresh_now(&self) -> Vec<IngestError> {
        self.status.set(Status::Loading);
        self.ingest().await
    }

    /// Ingest and record the outcome; the caller has already set Loading
    async fn ingest(&self) -> Vec<IngestError> {
        tracing::info!("Starting catalog refresh");

        let errors = self.ingestor.initialize_data().await;
        self.complete_ingestion(&errors);
        errors
    }

    /// Record the outcome of an ingestion run in the status register
    pub fn complete_ingestion(&self, errors: &[IngestError]) -> Status {
        let status = Status::from_errors(errors);

        for error in errors {
            tracing::error!(kind = %error.kind, error = %error, "Failed to ingest collection");
        }

        *self
            .last_completed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        self.status.set(status);

        tracing::info!(status = %status, failed = errors.len(), "Catalog refresh finished");
        status
    }

    /// Refresh loop; returns once `shutdown` fires
    ///
    /// While a run is in flight the loop only waits for the status to
    /// change, so it never starts a run that overlaps another one.
    pub async fn run(&self, mut shutdown: Shutdown) {
        let mut status_rx = self.status.subscribe();

        loop {
            let current = *status_rx.borrow_and_update();

            let Some(wait) = self.intervals.for_status(current) else {
                let settled = tokio::select! {
                    biased;
                    _ = shutdown.wait() => break,
                    settled = async {
                        status_rx.wait_for(|status| *status != Status::Loading).await.is_ok()
                    } => settled,
                };
                if !settled {
                    tracing::warn!("Status register dropped, stopping refresh loop");
                    break;
                }
                continue;
            };

            tracing::debug!(
                status = %current,
                next_refresh_in = %format_duration(wait),
                "Scheduling next refresh"
            );

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            // a manual refresh may have started while we slept
            if !self.status.try_begin_loading() {
                tracing::debug!("Refresh already in flight, waiting for it");
                continue;
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = self.ingest() => {}
            }
        }

        tracing::info!("Refresh scheduler stopped");
    }

    /// Start the first ingestion run and the refresh loop
    ///
    /// The status is Loading before this returns, so request handlers see a
    /// consistent state from the first request on.
    pub fn launch(self: &Arc<Self>, shutdown: Shutdown) -> LaunchHandles {
        self.status.set(Status::Loading);

        let scheduler = Arc::clone(self);
        let initial = tokio::spawn(async move { scheduler.refresh_now().await });

        let scheduler = Arc::clone(self);
        let refresh_loop = tokio::spawn(async move { scheduler.run(shutdown).await });

        LaunchHandles {
            initial,
            refresh_loop,
        }
    }
}
