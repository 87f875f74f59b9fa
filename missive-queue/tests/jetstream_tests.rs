//! JetStream queue tests
//!
//! These need a NATS server with JetStream enabled:
//! `nats-server -js` then
//! `NATS_URL=nats://127.0.0.1:4222 cargo test -p missive-queue -- --ignored --test-threads=1`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use missive_common::EmailJob;
use missive_queue::{JetStreamConfig, JetStreamQueue, JobQueue, QueueError};

async fn setup(name: &str) -> JetStreamQueue {
    let config = JetStreamConfig {
        url: std::env::var("NATS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string()),
        stream: format!("TEST_{name}"),
        subjects: vec![format!("TEST_{name}.*")],
        subject: format!("TEST_{name}.send"),
        consumer: format!("TEST_{name}_WORKER"),
        ack_wait_secs: 2,
        ..Default::default()
    };

    let queue = JetStreamQueue::connect(&config)
        .await
        .expect("Failed to connect to NATS");

    // Drain anything left behind by a previous run
    while let Some(job) = queue.fetch(Duration::from_millis(200)).await.unwrap() {
        job.ack().await.unwrap();
    }

    queue
}

fn job() -> EmailJob {
    EmailJob {
        recipients: vec!["to@example.com".to_string()],
        subject: "Hello".to_string(),
        body_content: "Hi".to_string(),
        app_tag: "billing".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a NATS server with JetStream"]
async fn test_publish_fetch_ack() {
    let queue = setup("ACK").await;
    queue.publish(&job()).await.unwrap();

    let fetched = queue.fetch(Duration::from_secs(5)).await.unwrap().unwrap();
    assert_eq!(EmailJob::from_slice(fetched.payload()).unwrap(), job());
    assert_eq!(fetched.delivery_count(), 1);
    fetched.ack().await.unwrap();

    assert!(queue.fetch(Duration::from_secs(1)).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a NATS server with JetStream"]
async fn test_nak_redelivers() {
    let queue = setup("NAK").await;
    queue.publish(&job()).await.unwrap();

    let first = queue.fetch(Duration::from_secs(5)).await.unwrap().unwrap();
    first.nak().await.unwrap();

    let second = queue.fetch(Duration::from_secs(5)).await.unwrap().unwrap();
    assert_eq!(second.delivery_count(), 2);
    second.ack().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a NATS server with JetStream"]
async fn test_connect_is_idempotent() {
    let _first = setup("IDEMPOTENT").await;
    let second = setup("IDEMPOTENT").await;

    second.stats().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a NATS server with JetStream"]
async fn test_job_without_recipients_refused() {
    let queue = setup("INVALID").await;
    let err = queue
        .publish(&EmailJob {
            recipients: vec![],
            ..job()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::InvalidJob(_)));
}
