//! Upstream ingestion pipeline
//!
//! - [`fetcher`]: one HTTP GET per call, decoded into a [`crate::models::Collection`]
//! - [`task`]: bounded retries with a fixed backoff around a fetcher
//! - [`orchestrator`]: four concurrent tasks, per-kind replacement in the store
//! - [`status`]: the Loading/Loaded/Failed register request handlers consult

pub mod fetcher;
pub mod orchestrator;
pub mod status;
pub mod task;

pub use fetcher::{Endpoints, HttpFetcher, ResourceFetcher};
pub use orchestrator::{IngestError, Ingestor};
pub use status::{LoadingStatus, Status, StatusRegister};
pub use task::{run_fetch_task, FetchOutcome};
