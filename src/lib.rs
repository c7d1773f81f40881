//! tourcat - Tour catalog with a self-refreshing ingestion pipeline
//!
//! Fetches four collections (artists, locations, dates, relations) from a
//! read-only upstream JSON API, keeps them in memory and serves them over
//! HTTP, while a background loop refreshes the catalog on a cadence that
//! adapts to success or failure.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Upstream record types and resource kinds
//! - [`ingest`] - Fetcher, retrying fetch tasks, orchestrator and status register
//! - [`catalog`] - In-memory store, lookups and relation processing
//! - [`scheduler`] - Refresh loop
//! - [`server`] - HTTP routes gated on catalog status
//! - [`utils`] - Retry, shutdown and error helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tourcat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = Arc::new(HttpFetcher::new(&config.upstream)?);
//!     let store = Arc::new(CatalogStore::new());
//!     let ingestor = Ingestor::new(fetcher, Arc::clone(&store), config.retry_config());
//!
//!     let errors = ingestor.initialize_data().await;
//!     println!("{} artists, {} errors", store.artists().len(), errors.len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod scheduler;
pub mod server;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::CatalogStore;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::ingest::{HttpFetcher, IngestError, Ingestor, ResourceFetcher, Status, StatusRegister};
    pub use crate::models::{Artist, Collection, ConcertDates, Location, Relation, ResourceKind};
    pub use crate::scheduler::{RefreshIntervals, RefreshScheduler};
    pub use crate::utils::retry::RetryConfig;
    pub use crate::utils::shutdown::{Shutdown, ShutdownHandle};
}

// Direct re-exports for convenience
pub use models::{Artist, Collection, ResourceKind};
