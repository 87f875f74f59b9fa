#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::{sync::Arc, time::Duration};

use missive_common::Signal;
use missive_delivery::{
    DeliveryWorker, SummaryReporter, WorkerConfig, WorkerCounters,
};
use missive_directory::MemorySenderDirectory;
use missive_queue::{JobQueue, MemoryQueue};
use missive_transport::SendOutcome;
use pretty_assertions::assert_eq;
use support::{BrokenQueue, Harness, ScriptedTransport, job};
use tokio::sync::broadcast;

async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn test_serve_processes_until_shutdown() {
    let harness = Harness::new(ScriptedTransport::always(SendOutcome::Accepted));
    let (tx, _) = broadcast::channel(4);

    let worker = harness.worker.clone();
    let rx = tx.subscribe();
    let handle = tokio::spawn(async move { worker.serve(0, rx).await });

    for _ in 0..3 {
        harness.queue.publish(&job()).await.unwrap();
    }

    let counters = harness.counters.clone();
    wait_for(|| counters.snapshot().processed == 3).await;

    tx.send(Signal::Shutdown).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("worker stops promptly")
        .unwrap();

    assert_eq!(harness.queue.acked(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_job_finishes_on_shutdown() {
    let harness = Harness::new(ScriptedTransport::new(
        [SendOutcome::Throttled {
            retry_after: Some(Duration::from_secs(30)),
        }],
        SendOutcome::Accepted,
    ));
    let (tx, _) = broadcast::channel(4);
    harness.queue.publish(&job()).await.unwrap();

    let worker = harness.worker.clone();
    let rx = tx.subscribe();
    let handle = tokio::spawn(async move { worker.serve(0, rx).await });

    let transport = harness.transport.clone();
    wait_for(|| transport.calls() == 1).await;

    // The worker is waiting out the throttle hint
    tx.send(Signal::Shutdown).unwrap();
    handle.await.unwrap();

    assert_eq!(harness.counters.snapshot().processed, 1);
    assert_eq!(harness.counters.snapshot().throttled, 1);
    assert_eq!(harness.queue.acked(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_competing_workers_share_counters() {
    let queue = MemoryQueue::new();
    let counters = Arc::new(WorkerCounters::new());
    let transport = Arc::new(ScriptedTransport::always(SendOutcome::Accepted));
    let worker = DeliveryWorker::new(
        WorkerConfig {
            concurrency: 3,
            ..WorkerConfig::default()
        },
        Arc::new(queue.clone()),
        Arc::new(MemorySenderDirectory::with_senders([(
            "billing",
            "billing@example.com",
        )])),
        transport.clone(),
        counters.clone(),
    );

    let (tx, _) = broadcast::channel(4);
    let handles: Vec<_> = (0..worker.config().concurrency)
        .map(|id| {
            let worker = worker.clone();
            let rx = tx.subscribe();
            tokio::spawn(async move { worker.serve(id, rx).await })
        })
        .collect();

    for _ in 0..10 {
        queue.publish(&job()).await.unwrap();
    }

    wait_for(|| counters.snapshot().processed == 10).await;
    tx.send(Signal::Shutdown).unwrap();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(transport.calls(), 10);
    assert_eq!(queue.acked(), 10);
    assert_eq!(queue.naked(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_errors_pause_and_shutdown() {
    let worker = DeliveryWorker::new(
        WorkerConfig::default(),
        Arc::new(BrokenQueue),
        Arc::new(MemorySenderDirectory::new()),
        Arc::new(ScriptedTransport::always(SendOutcome::Accepted)),
        Arc::new(WorkerCounters::new()),
    );
    let (tx, _) = broadcast::channel(4);

    let rx = tx.subscribe();
    let handle = tokio::spawn(async move { worker.serve(0, rx).await });

    tokio::time::sleep(Duration::from_secs(5)).await;
    tx.send(Signal::Shutdown).unwrap();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("worker stops while pausing")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_summary_reports_counters_and_depth() {
    let queue = MemoryQueue::new();
    queue.publish(&job()).await.unwrap();

    let counters = Arc::new(WorkerCounters::new());
    counters.record_processed();
    counters.record_failed();

    let reporter = SummaryReporter::new(
        Arc::new(queue),
        counters,
        Duration::from_secs(30),
    );

    assert_eq!(
        reporter.report().await,
        "Summary: stream messages: 1, consumer pending: 1, processed: 1, throttled: 0, failed: 1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_summary_survives_stats_failure() {
    let reporter = SummaryReporter::new(
        Arc::new(BrokenQueue),
        Arc::new(WorkerCounters::new()),
        Duration::from_secs(30),
    );

    let line = reporter.report().await;
    assert!(line.contains("could not retrieve queue stats"), "{line}");

    let (tx, _) = broadcast::channel(4);
    let rx = tx.subscribe();
    let handle = tokio::spawn(async move { reporter.serve(rx).await });

    // Several failing ticks must not stop the loop
    tokio::time::sleep(Duration::from_secs(95)).await;
    assert!(!handle.is_finished());

    tx.send(Signal::Shutdown).unwrap();
    handle.await.unwrap();
}
