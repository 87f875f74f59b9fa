pub mod backends;
pub mod config;
pub mod error;
pub mod r#trait;

pub use backends::{MemorySenderDirectory, PostgresDirectory};
pub use config::{DirectoryConfig, MemoryConfig, PostgresConfig, SeedSender};
pub use error::{DirectoryError, Result};
pub use r#trait::SenderDirectory;
