//! Error types for queue operations.

use missive_common::JobError;
use thiserror::Error;

/// Top-level queue error type.
///
/// Client errors from the broker are carried as text; callers only log them
/// or abort startup.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Could not reach the broker.
    #[error("Failed to connect to queue: {0}")]
    Connect(String),

    /// Stream or consumer could not be created or looked up.
    #[error("Queue setup failed: {0}")]
    Setup(String),

    /// Pulling a message failed for a reason other than an empty queue.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Acknowledging or rejecting a message failed.
    #[error("Acknowledgement failed: {0}")]
    Ack(String),

    /// The broker did not confirm a published message.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Stream or consumer state could not be read.
    #[error("Could not read queue stats: {0}")]
    Stats(String),

    /// A job was refused before reaching the queue.
    #[error("Invalid job: {0}")]
    InvalidJob(#[from] JobError),
}

/// Specialized `Result` type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
