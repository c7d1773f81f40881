//! Refresh scheduler behavior under virtual time

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use common::{build_scheduler, no_retry, ScriptedFetcher};
use tourcat::ingest::Status;
use tourcat::models::ResourceKind;
use tourcat::utils::retry::RetryConfig;
use tourcat::utils::shutdown;

const KINDS: u32 = ResourceKind::ALL.len() as u32;

#[tokio::test(start_paused = true)]
async fn test_launch_loads_catalog() {
    let fetcher = ScriptedFetcher::healthy();
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());
    let (handle, rx) = shutdown::channel();

    let handles = scheduler.launch(rx);
    assert_eq!(scheduler.status().status(), Status::Loading);

    let errors = handles.initial.await.unwrap();
    assert!(errors.is_empty());
    assert_eq!(scheduler.status().status(), Status::Loaded);
    assert_eq!(scheduler.ingestor().store().len(ResourceKind::Artists), 2);
    assert!(scheduler.last_completed().is_some());

    handle.trigger();
    handles.refresh_loop.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_retries_and_recovers() {
    let fetcher = ScriptedFetcher::down();
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());
    let (handle, rx) = shutdown::channel();

    let handles = scheduler.launch(rx);
    let errors = handles.initial.await.unwrap();
    assert_eq!(errors.len(), 4);
    assert_eq!(scheduler.status().status(), Status::Failed);

    fetcher.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(scheduler.status().status(), Status::Loaded);
    assert_eq!(fetcher.calls(), 2 * KINDS);

    handle.trigger();
    handles.refresh_loop.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_retries_every_failed_interval() {
    let fetcher = ScriptedFetcher::down();
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());
    let (handle, rx) = shutdown::channel();

    let handles = scheduler.launch(rx);
    handles.initial.await.unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;

    // initial run plus refreshes at 1s, 2s and 3s
    assert_eq!(fetcher.calls(), 4 * KINDS);
    assert_eq!(scheduler.status().status(), Status::Failed);

    handle.trigger();
    handles.refresh_loop.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_loaded_waits_full_interval() {
    let fetcher = ScriptedFetcher::healthy();
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());
    let (handle, rx) = shutdown::channel();

    let handles = scheduler.launch(rx);
    handles.initial.await.unwrap();
    assert_eq!(fetcher.calls(), KINDS);

    tokio::time::sleep(Duration::from_secs(23 * 60 * 60)).await;
    assert_eq!(fetcher.calls(), KINDS);

    tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(fetcher.calls(), 2 * KINDS);
    assert_eq!(scheduler.status().status(), Status::Loaded);

    handle.trigger();
    handles.refresh_loop.await.unwrap();
}

/// A Loading status that never settles keeps the loop idle
#[tokio::test(start_paused = true)]
async fn test_loading_status_never_starts_second_run() {
    let fetcher = ScriptedFetcher::healthy();
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());
    let (handle, rx) = shutdown::channel();

    let looping = Arc::clone(&scheduler);
    let refresh_loop = tokio::spawn(async move { looping.run(rx).await });

    tokio::time::sleep(Duration::from_secs(48 * 60 * 60)).await;
    assert_eq!(fetcher.calls(), 0);

    // once the in-flight run reports, the loop picks up the cadence
    scheduler.complete_ingestion(&[]);
    tokio::time::sleep(Duration::from_secs(24 * 60 * 60 + 1)).await;
    assert_eq!(fetcher.calls(), KINDS);

    handle.trigger();
    refresh_loop.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_exits_promptly_from_every_state() {
    for status in [Status::Loading, Status::Loaded, Status::Failed] {
        let fetcher = ScriptedFetcher::down();
        let scheduler = build_scheduler(Arc::clone(&fetcher), RetryConfig::default());
        scheduler.status().set(status);

        let (handle, rx) = shutdown::channel();
        let looping = Arc::clone(&scheduler);
        let refresh_loop = tokio::spawn(async move { looping.run(rx).await });

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.trigger();

        let started = Instant::now();
        refresh_loop.await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO, "{status}");
        assert_eq!(fetcher.calls(), 0, "{status}");
    }
}

/// A manual refresh in flight when the wait ends is not duplicated
#[tokio::test(start_paused = true)]
async fn test_loop_defers_to_manual_refresh_in_flight() {
    let fetcher = ScriptedFetcher::down();
    let scheduler = build_scheduler(Arc::clone(&fetcher), RetryConfig::default());
    scheduler.status().set(Status::Failed);

    let (handle, rx) = shutdown::channel();
    let looping = Arc::clone(&scheduler);
    let refresh_loop = tokio::spawn(async move { looping.run(rx).await });

    tokio::time::sleep(Duration::from_millis(500)).await;
    let manual = Arc::clone(&scheduler);
    let manual_run = tokio::spawn(async move { manual.refresh_now().await });

    // loop wait ends at 1s, during the manual run's first backoff
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(scheduler.status().status(), Status::Loading);
    assert_eq!(fetcher.calls(), KINDS);

    // manual attempts at 0.5s, 1.5s and 2.5s
    let errors = manual_run.await.unwrap();
    assert_eq!(errors.len(), 4);
    assert_eq!(fetcher.calls(), 3 * KINDS);
    assert_eq!(scheduler.status().status(), Status::Failed);

    // the loop picks up again one failed interval later, at 3.5s
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fetcher.calls(), 3 * KINDS);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(fetcher.calls(), 4 * KINDS);

    handle.trigger();
    refresh_loop.await.unwrap();
}

/// Shutdown mid-refresh abandons the run instead of waiting it out
#[tokio::test(start_paused = true)]
async fn test_shutdown_during_refresh_cycle() {
    let fetcher = ScriptedFetcher::down();
    let scheduler = build_scheduler(Arc::clone(&fetcher), RetryConfig::default());
    scheduler.status().set(Status::Failed);

    let (handle, rx) = shutdown::channel();
    let looping = Arc::clone(&scheduler);
    let refresh_loop = tokio::spawn(async move { looping.run(rx).await });

    // refresh starts at 1s; each kind is then in its first 1s backoff
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(fetcher.calls(), KINDS);
    handle.trigger();

    let started = Instant::now();
    refresh_loop.await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(fetcher.calls(), KINDS);
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_cycle() {
    let fetcher = ScriptedFetcher::healthy();
    fetcher.fail_kind(ResourceKind::Dates);
    let scheduler = build_scheduler(Arc::clone(&fetcher), no_retry());

    let errors = scheduler.refresh_now().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ResourceKind::Dates);
    assert_eq!(scheduler.status().status(), Status::Failed);

    let store = scheduler.ingestor().store();
    assert_eq!(store.len(ResourceKind::Artists), 2);
    assert!(store.dates().is_empty());
}
