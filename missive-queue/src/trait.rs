use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use missive_common::EmailJob;

use crate::{QueueStats, Result};

/// A durable work queue shared by competing consumers.
///
/// Each message is handed to one consumer at a time. A message that is
/// rejected, or never acknowledged, is delivered again later.
#[async_trait]
pub trait JobQueue: Send + Sync + Debug {
    /// Pull at most one message, waiting up to `max_wait` for one to arrive
    ///
    /// Returns `Ok(None)` when the wait elapsed without a message.
    ///
    /// # Errors
    /// Returns [`crate::QueueError::Fetch`] for any failure other than an
    /// empty queue
    async fn fetch(&self, max_wait: Duration) -> Result<Option<Box<dyn QueuedJob>>>;

    /// Current stream and consumer depth
    ///
    /// # Errors
    /// Returns [`crate::QueueError::Stats`] if the state could not be read
    async fn stats(&self) -> Result<QueueStats>;

    /// Publish a raw payload to the send subject and wait for it to be stored
    ///
    /// # Errors
    /// Returns [`crate::QueueError::Publish`] if the broker did not confirm it
    async fn publish_payload(&self, payload: Vec<u8>) -> Result<()>;

    /// Validate and publish a job
    ///
    /// # Errors
    /// Returns [`crate::QueueError::InvalidJob`] for a job without recipients,
    /// or a publish failure
    async fn publish(&self, job: &EmailJob) -> Result<()> {
        job.validate()?;
        self.publish_payload(job.to_vec()?).await
    }
}

/// A message pulled from a [`JobQueue`] awaiting its verdict.
#[async_trait]
pub trait QueuedJob: Send + Sync + Debug {
    fn payload(&self) -> &[u8];

    /// How many times this message has been handed out, counting this one
    fn delivery_count(&self) -> u64;

    /// Remove the message from the queue for good
    async fn ack(&self) -> Result<()>;

    /// Ask for the message to be delivered again
    async fn nak(&self) -> Result<()>;
}
