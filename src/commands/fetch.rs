use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use tourcat::catalog::CatalogStore;
use tourcat::config::Config;
use tourcat::ingest::{HttpFetcher, Ingestor, StatusRegister};
use tourcat::models::ResourceKind;
use tourcat::scheduler::RefreshScheduler;
use tourcat::utils::{format_duration, truncate_text};

const MAX_ERROR_WIDTH: usize = 160;

/// Run one ingestion and print what arrived
pub async fn fetch(config: &Config) -> Result<()> {
    println!("Fetching catalog from {}", config.upstream.base_url);
    println!();

    let fetcher =
        Arc::new(HttpFetcher::new(&config.upstream).context("Failed to create upstream fetcher")?);
    let store = Arc::new(CatalogStore::new());
    let ingestor = Ingestor::new(fetcher, Arc::clone(&store), config.retry_config());
    let scheduler = RefreshScheduler::new(
        Arc::new(ingestor),
        Arc::new(StatusRegister::new()),
        config.refresh_intervals(),
    );

    let started = Instant::now();
    let errors = scheduler.refresh_now().await;

    println!("Fetch Summary");
    println!("=============");
    println!("  Status: {}", scheduler.status().status());
    println!("  Elapsed: {}", format_duration(started.elapsed()));
    for kind in ResourceKind::ALL {
        println!("  {:<10} {}", format!("{kind}:"), store.len(kind));
    }

    if !errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &errors {
            println!("  - {}", truncate_text(&error.to_string(), MAX_ERROR_WIDTH));
        }
        anyhow::bail!(
            "{} of {} collections failed",
            errors.len(),
            ResourceKind::ALL.len()
        );
    }

    Ok(())
}
