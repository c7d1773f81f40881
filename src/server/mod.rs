//! HTTP server for the catalog
//!
//! Handlers only read the store and the status register; the manual refresh
//! route is the one place a request can start an ingestion run.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogStore;
use crate::error::{Error, Result};
use crate::ingest::StatusRegister;
use crate::scheduler::RefreshScheduler;
use crate::utils::shutdown::Shutdown;

use api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Catalog read by every handler
    pub store: Arc<CatalogStore>,

    /// Readiness consulted before serving catalog routes
    pub status: Arc<StatusRegister>,

    /// Used by the manual refresh route and `/status`
    pub scheduler: Arc<RefreshScheduler>,

    /// `Refresh` header delay on `/loading`
    pub loading_refresh_secs: u64,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<RefreshScheduler>, loading_refresh_secs: u64) -> Self {
        Self {
            store: Arc::clone(scheduler.ingestor().store()),
            status: Arc::clone(scheduler.status()),
            scheduler,
            loading_refresh_secs,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Catalog Server
// ============================================================================

pub struct CatalogServer {
    bind_address: SocketAddr,
    state: AppState,
}

impl CatalogServer {
    pub fn new(bind_address: SocketAddr, state: AppState) -> Self {
        Self {
            bind_address,
            state,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until `shutdown` fires
    pub async fn start_with_shutdown(&self, shutdown: Shutdown) -> Result<()> {
        let listener = TcpListener::bind(self.bind_address)
            .await
            .map_err(|e| Error::with_source(format!("Failed to bind {}", self.bind_address), e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires
    pub async fn serve(&self, listener: TcpListener, mut shutdown: Shutdown) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Starting catalog server");

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("Catalog server shutdown complete");
        Ok(())
    }
}
