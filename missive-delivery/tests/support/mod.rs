#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use missive_common::EmailJob;
use missive_delivery::{DeliveryWorker, WorkerConfig, WorkerCounters};
use missive_directory::MemorySenderDirectory;
use missive_queue::{JobQueue, MemoryQueue, QueueError, QueueStats, QueuedJob};
use missive_transport::{MailTransport, OutboundMessage, SendOutcome};
use parking_lot::Mutex;

/// Transport answering from a fixed script, then with a fallback outcome.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<SendOutcome>>,
    fallback: SendOutcome,
    sent: Mutex<Vec<(tokio::time::Instant, OutboundMessage)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = SendOutcome>, fallback: SendOutcome) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: SendOutcome) -> Self {
        Self::new(Vec::<SendOutcome>::new(), outcome)
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    /// Time between consecutive send calls
    pub fn gaps(&self) -> Vec<Duration> {
        self.sent
            .lock()
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, message: &OutboundMessage) -> SendOutcome {
        self.sent
            .lock()
            .push((tokio::time::Instant::now(), message.clone()));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Queue whose every operation fails.
#[derive(Debug, Default)]
pub struct BrokenQueue;

#[async_trait]
impl JobQueue for BrokenQueue {
    async fn fetch(&self, _max_wait: Duration) -> missive_queue::Result<Option<Box<dyn QueuedJob>>> {
        Err(QueueError::Fetch("connection reset".to_string()))
    }

    async fn stats(&self) -> missive_queue::Result<QueueStats> {
        Err(QueueError::Stats("connection reset".to_string()))
    }

    async fn publish_payload(&self, _payload: Vec<u8>) -> missive_queue::Result<()> {
        Err(QueueError::Publish("connection reset".to_string()))
    }
}

pub struct Harness {
    pub queue: MemoryQueue,
    pub transport: Arc<ScriptedTransport>,
    pub counters: Arc<WorkerCounters>,
    pub worker: DeliveryWorker,
}

impl Harness {
    /// Worker with default settings and one sender registered for `billing`
    pub fn new(transport: ScriptedTransport) -> Self {
        let queue = MemoryQueue::new();
        let transport = Arc::new(transport);
        let counters = Arc::new(WorkerCounters::new());
        let directory =
            MemorySenderDirectory::with_senders([("billing", "billing@example.com")]);

        let worker = DeliveryWorker::new(
            WorkerConfig::default(),
            Arc::new(queue.clone()),
            Arc::new(directory),
            transport.clone(),
            counters.clone(),
        );

        Self {
            queue,
            transport,
            counters,
            worker,
        }
    }

    /// Publish a payload and run the worker on it once
    pub async fn process_payload(&self, payload: Vec<u8>) {
        self.queue.publish_payload(payload).await.unwrap();
        self.process_next().await;
    }

    pub async fn process(&self, job: &EmailJob) {
        self.process_payload(serde_json::to_vec(job).unwrap()).await;
    }

    /// Run the worker on the next ready message
    pub async fn process_next(&self) {
        let job = self
            .queue
            .fetch(Duration::from_secs(1))
            .await
            .unwrap()
            .expect("a ready message");
        self.worker.process_job(job).await;
    }
}

pub fn job() -> EmailJob {
    EmailJob {
        recipients: vec!["to@example.com".to_string()],
        subject: "Invoice".to_string(),
        body_content: "Your invoice is attached".to_string(),
        app_tag: "billing".to_string(),
        ..Default::default()
    }
}
