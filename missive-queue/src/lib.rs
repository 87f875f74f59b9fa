pub mod backends;
pub mod config;
pub mod error;
pub mod r#trait;
pub mod types;

pub use backends::{JetStreamQueue, MemoryQueue};
pub use config::{JetStreamConfig, QueueConfig};
pub use error::{QueueError, Result};
pub use r#trait::{JobQueue, QueuedJob};
pub use types::QueueStats;
