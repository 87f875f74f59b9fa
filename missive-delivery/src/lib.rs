//! Delivery workers for queued email jobs
//!
//! This crate provides:
//! - The per-job state machine: parse, resolve sender, decode attachments,
//!   send with retries, then ack or nak
//! - Process-wide outcome counters shared by every worker loop
//! - The periodic summary of counters and queue depth

mod attachments;
mod counters;
mod error;
mod policy;
mod types;
pub mod worker;

pub use attachments::decode_attachments;
pub use counters::{CounterSnapshot, WorkerCounters};
pub use error::{DeliveryError, PermanentError, TemporaryError};
pub use policy::RetryPolicy;
pub use types::DeliveryAttempt;
pub use worker::{DeliveryWorker, WorkerConfig, summary::SummaryReporter};
