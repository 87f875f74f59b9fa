//! Types shared by every missive crate: the queued job model, the sender
//! identity, logging setup and the process lifecycle signal.

pub mod job;
pub mod logging;
pub mod sender;

pub use job::{Attachment, BodyKind, EmailJob, JobError};
pub use sender::Sender;
pub use tracing;

/// Lifecycle signal broadcast to long-running tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
