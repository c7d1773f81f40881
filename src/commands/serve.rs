use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use tourcat::catalog::CatalogStore;
use tourcat::config::Config;
use tourcat::ingest::{HttpFetcher, Ingestor, StatusRegister};
use tourcat::scheduler::RefreshScheduler;
use tourcat::server::{AppState, CatalogServer};
use tourcat::utils::format_duration;
use tourcat::utils::shutdown;

/// Start the ingestion pipeline and the HTTP server
///
/// `bind` overrides the configured listen address.
pub async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    let retry = config.retry_config();
    let intervals = config.refresh_intervals();

    println!("Starting Catalog Server");
    println!("=======================");
    println!("  Bind Address: {}", config.server.bind_address);
    println!("  Upstream: {}", config.upstream.base_url);
    println!(
        "  Retry: {} attempts, {} timeout, {} backoff",
        retry.total_attempts(),
        format_duration(retry.attempt_timeout),
        format_duration(retry.backoff)
    );
    println!(
        "  Refresh: every {}, {} after failure",
        format_duration(intervals.loaded_interval),
        format_duration(intervals.failed_interval)
    );
    println!();

    let (handle, shutdown) = shutdown::channel();

    let fetcher =
        Arc::new(HttpFetcher::new(&config.upstream).context("Failed to create upstream fetcher")?);
    let store = Arc::new(CatalogStore::new());
    let ingestor =
        Arc::new(Ingestor::new(fetcher, store, retry).with_shutdown(shutdown.clone()));
    let scheduler = Arc::new(RefreshScheduler::new(
        ingestor,
        Arc::new(StatusRegister::new()),
        intervals,
    ));

    let handles = scheduler.launch(shutdown.clone());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                handle.trigger();
            }
            Err(e) => {
                tracing::error!("Failed to wait for Ctrl+C: {}", e);
            }
        }
    });

    let state = AppState::new(Arc::clone(&scheduler), config.server.loading_refresh_secs);
    let server = CatalogServer::new(config.server.bind_address, state);
    server
        .start_with_shutdown(shutdown)
        .await
        .context("Catalog server failed")?;

    handles
        .refresh_loop
        .await
        .context("Refresh loop panicked")?;
    // cancelled by the same shutdown; only its completion matters here
    let _ = handles.initial.await;

    println!("Catalog server stopped.");
    Ok(())
}
