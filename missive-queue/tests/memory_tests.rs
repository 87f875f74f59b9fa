#![allow(clippy::unwrap_used)]

use std::time::Duration;

use missive_common::{EmailJob, JobError};
use missive_queue::{JobQueue, MemoryQueue, QueueError};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_publish_round_trips_job() {
    let queue = MemoryQueue::new();
    let job = EmailJob {
        recipients: vec!["to@example.com".to_string()],
        subject: "Hello".to_string(),
        app_tag: "billing".to_string(),
        ..Default::default()
    };

    queue.publish(&job).await.unwrap();

    let fetched = queue.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
    assert_eq!(EmailJob::from_slice(fetched.payload()).unwrap(), job);
}

#[tokio::test]
async fn test_publish_refuses_empty_recipients() {
    let queue = MemoryQueue::new();
    let job = EmailJob {
        app_tag: "billing".to_string(),
        ..Default::default()
    };

    let err = queue.publish(&job).await.unwrap_err();

    assert!(matches!(err, QueueError::InvalidJob(JobError::NoRecipients)));
    assert_eq!(queue.ready(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_message_delivered_to_one_consumer() {
    let queue = MemoryQueue::new();
    for i in 0..100u32 {
        queue.publish_payload(i.to_be_bytes().to_vec()).await.unwrap();
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(job) = queue.fetch(Duration::from_millis(50)).await.unwrap() {
                    seen.push(job.payload().to_vec());
                    job.ack().await.unwrap();
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.await.unwrap());
    }
    all.sort();
    all.dedup();

    assert_eq!(all.len(), 100);
    assert_eq!(queue.acked(), 100);
}
