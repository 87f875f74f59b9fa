use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{sync::Notify, time::Instant};

use crate::{
    QueueError, QueueStats, Result,
    r#trait::{JobQueue, QueuedJob},
};

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    payload: Vec<u8>,
    deliveries: u64,
}

#[derive(Debug, Default)]
struct State {
    ready: VecDeque<Entry>,
    in_flight: HashMap<u64, Entry>,
    next_id: u64,
    acked: u64,
    naked: u64,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    available: Notify,
}

/// In-process job queue
///
/// Follows the same contract as the broker-backed queue: one consumer at a
/// time per message, and a rejected message goes to the back of the queue to
/// be delivered again. There is no ack-wait timer, so a job that is neither
/// acked nor naked stays in flight.
///
/// Clones share the same queue, which lets tests publish and inspect from
/// outside the workers.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    inner: Arc<Inner>,
}

impl MemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn try_take(&self) -> Option<MemoryJob> {
        let mut state = self.inner.state.lock();
        let mut entry = state.ready.pop_front()?;
        entry.deliveries += 1;
        state.in_flight.insert(entry.id, entry.clone());

        Some(MemoryJob {
            id: entry.id,
            payload: entry.payload,
            delivery_count: entry.deliveries,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Messages acknowledged so far
    #[must_use]
    pub fn acked(&self) -> u64 {
        self.inner.state.lock().acked
    }

    /// Rejections received so far
    #[must_use]
    pub fn naked(&self) -> u64 {
        self.inner.state.lock().naked
    }

    /// Messages waiting to be handed out
    #[must_use]
    pub fn ready(&self) -> usize {
        self.inner.state.lock().ready.len()
    }

    /// Messages handed out and awaiting a verdict
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn fetch(&self, max_wait: Duration) -> Result<Option<Box<dyn QueuedJob>>> {
        let deadline = Instant::now() + max_wait;

        loop {
            let available = self.inner.available.notified();

            if let Some(job) = self.try_take() {
                return Ok(Some(Box::new(job)));
            }

            if tokio::time::timeout_at(deadline, available).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn stats(&self) -> Result<QueueStats> {
        let state = self.inner.state.lock();
        let ready = state.ready.len() as u64;

        Ok(QueueStats {
            stream_messages: ready + state.in_flight.len() as u64,
            consumer_pending: ready,
        })
    }

    async fn publish_payload(&self, payload: Vec<u8>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.ready.push_back(Entry {
                id,
                payload,
                deliveries: 0,
            });
        }

        self.inner.available.notify_one();
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryJob {
    id: u64,
    payload: Vec<u8>,
    delivery_count: u64,
    inner: Arc<Inner>,
}

#[async_trait]
impl QueuedJob for MemoryJob {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    async fn ack(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.in_flight.remove(&self.id).is_none() {
            return Err(QueueError::Ack(format!("message {} is not in flight", self.id)));
        }
        state.acked += 1;
        Ok(())
    }

    async fn nak(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            let Some(entry) = state.in_flight.remove(&self.id) else {
                return Err(QueueError::Ack(format!("message {} is not in flight", self.id)));
            };
            state.naked += 1;
            state.ready.push_back(entry);
        }

        self.inner.available.notify_one();
        Ok(())
    }
}
