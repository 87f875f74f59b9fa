//! Typed error handling for delivery operations.
//!
//! The categories decide what happens to the queued message:
//! - Permanent failures are acknowledged and never redelivered
//! - Temporary failures are rejected so the queue redelivers them

use missive_common::JobError;
use missive_directory::DirectoryError;
use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The job can never succeed; it is acknowledged and dropped.
    #[error("Permanent failure: {0}")]
    Permanent(#[from] PermanentError),

    /// The job may succeed later; it is handed back to the queue.
    #[error("Temporary failure: {0}")]
    Temporary(#[from] TemporaryError),
}

/// Failures inherent to the job.
#[derive(Debug, Error)]
pub enum PermanentError {
    /// The payload is not a usable job.
    #[error("Malformed job: {0}")]
    MalformedJob(#[from] JobError),

    /// No sending mailbox could be resolved for the job's application tag.
    #[error("Sender unavailable: {0}")]
    SenderUnavailable(#[from] DirectoryError),

    /// An attachment's content is not valid base64.
    #[error("Attachment {name} could not be decoded: {reason}")]
    InvalidAttachment { name: String, reason: String },
}

/// Failures after which the job is redelivered.
#[derive(Debug, Error)]
pub enum TemporaryError {
    /// The provider answered with a status it should not have; remaining
    /// attempts are skipped.
    #[error("Provider rejected the message with status {status}: {body}")]
    ProviderRejected { status: u16, body: String },

    /// Every attempt was throttled or failed in transit.
    #[error("Gave up after {attempts} attempts, last outcome: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl DeliveryError {
    /// Returns `true` if this error is temporary and the job should be redelivered.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns `true` if this error is permanent and the job should be dropped.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

impl From<JobError> for DeliveryError {
    fn from(err: JobError) -> Self {
        Self::Permanent(err.into())
    }
}

impl From<DirectoryError> for DeliveryError {
    fn from(err: DirectoryError) -> Self {
        Self::Permanent(err.into())
    }
}
