use std::sync::Arc;

use serde::Deserialize;

use crate::{
    MemorySenderDirectory, PostgresDirectory, Result, r#trait::SenderDirectory,
};

const fn default_max_connections() -> u32 {
    5
}

const fn default_acquire_timeout() -> u64 {
    5
}

/// Configuration for the sender directory
///
/// Postgres in RON config:
/// ```ron
/// directory: (
///     type: "Postgres",
///     url: "postgres://missive@localhost/missive",
/// ),
/// ```
///
/// Memory-backed directory seeded with one sender:
/// ```ron
/// directory: (
///     type: "Memory",
///     senders: [(app_tag: "billing", email: "billing@example.com")],
/// ),
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DirectoryConfig {
    Postgres(PostgresConfig),
    Memory(MemoryConfig),
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long to wait for a pooled connection (in seconds)
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub senders: Vec<SeedSender>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSender {
    pub app_tag: String,
    pub email: String,
}

impl DirectoryConfig {
    /// Build the configured directory
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached
    pub async fn connect(&self) -> Result<Arc<dyn SenderDirectory>> {
        Ok(match self {
            Self::Postgres(config) => Arc::new(PostgresDirectory::connect(config).await?),
            Self::Memory(config) => Arc::new(MemorySenderDirectory::with_senders(
                config
                    .senders
                    .iter()
                    .map(|s| (s.app_tag.as_str(), s.email.as_str())),
            )),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_defaults() {
        let config: DirectoryConfig =
            ron::from_str(r#"(type: "Postgres", url: "postgres://localhost/missive")"#).unwrap();

        let DirectoryConfig::Postgres(config) = config else {
            panic!("expected Postgres config, got {config:?}");
        };
        assert_eq!(config.url, "postgres://localhost/missive");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_memory_seeded() {
        let config: DirectoryConfig = ron::from_str(
            r#"(type: "Memory", senders: [(app_tag: "billing", email: "billing@example.com")])"#,
        )
        .unwrap();

        let directory = config.connect().await.unwrap();
        let sender = directory.resolve_sender("billing").await.unwrap();
        assert_eq!(sender.email, "billing@example.com");
    }
}
