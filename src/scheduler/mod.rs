//! Catalog refresh scheduling
//!
//! A single loop re-runs ingestion on a cadence picked from the current
//! status: a long wait after a clean run, a short one after a failed run,
//! and no timer at all while a run is in flight.
//!
//! ```text
//!            launch()
//!               │
//!               ▼
//!   ┌──────► Loading ──── zero errors ────► Loaded
//!   │           │                              │
//!   │      any error                  loaded_interval
//!   │           ▼                              │
//!   │        Failed ── failed_interval ──┐     │
//!   │                                    │     │
//!   └────────────── refresh_now() ◄──────┴─────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tourcat::catalog::CatalogStore;
//! use tourcat::ingest::{HttpFetcher, Ingestor, StatusRegister};
//! use tourcat::scheduler::{RefreshIntervals, RefreshScheduler};
//! use tourcat::utils::retry::RetryConfig;
//! use tourcat::utils::shutdown;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (handle, shutdown) = shutdown::channel();
//!     let fetcher = Arc::new(HttpFetcher::with_base_url("https://groupietrackers.herokuapp.com")?);
//!     let store = Arc::new(CatalogStore::new());
//!     let ingestor = Ingestor::new(fetcher, store, RetryConfig::default())
//!         .with_shutdown(shutdown.clone());
//!
//!     let scheduler = Arc::new(RefreshScheduler::new(
//!         Arc::new(ingestor),
//!         Arc::new(StatusRegister::new()),
//!         RefreshIntervals::default(),
//!     ));
//!     let handles = scheduler.launch(shutdown);
//!
//!     handle.trigger();
//!     handles.refresh_loop.await?;
//!     Ok(())
//! }
//! ```

mod refresh;

pub use refresh::{LaunchHandles, RefreshIntervals, RefreshScheduler};
