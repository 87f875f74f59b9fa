use std::sync::Arc;

use serde::Deserialize;

use crate::{JetStreamQueue, MemoryQueue, Result, r#trait::JobQueue};

mod defaults {
    pub fn url() -> String {
        "nats://127.0.0.1:4222".to_string()
    }

    pub fn stream() -> String {
        "EMAILS".to_string()
    }

    pub fn subjects() -> Vec<String> {
        vec!["EMAILS.*".to_string()]
    }

    pub fn subject() -> String {
        "EMAILS.send".to_string()
    }

    pub fn consumer() -> String {
        "EMAIL_WORKER".to_string()
    }

    pub const fn ack_wait_secs() -> u64 {
        30
    }
}

/// Configuration for the job queue
///
/// ```ron
/// queue: (
///     type: "JetStream",
///     url: "nats://nats.internal:4222",
/// ),
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum QueueConfig {
    JetStream(JetStreamConfig),
    /// In-process queue; jobs are lost on exit
    Memory,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::JetStream(JetStreamConfig::default())
    }
}

impl QueueConfig {
    /// Connect to the configured queue and make sure it is ready to use
    ///
    /// # Errors
    /// Returns an error if the broker is unreachable or the stream or
    /// consumer cannot be set up
    pub async fn connect(&self) -> Result<Arc<dyn JobQueue>> {
        Ok(match self {
            Self::JetStream(config) => Arc::new(JetStreamQueue::connect(config).await?),
            Self::Memory => Arc::new(MemoryQueue::new()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JetStreamConfig {
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Client name reported to the server
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "defaults::stream")]
    pub stream: String,

    /// Subjects the stream captures
    #[serde(default = "defaults::subjects")]
    pub subjects: Vec<String>,

    /// Subject jobs are published on
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// Durable consumer shared by every worker
    #[serde(default = "defaults::consumer")]
    pub consumer: String,

    /// How long the server waits for an ack before redelivering (in seconds)
    #[serde(default = "defaults::ack_wait_secs")]
    pub ack_wait_secs: u64,
}

impl Default for JetStreamConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            name: None,
            token: None,
            username: None,
            password: None,
            stream: defaults::stream(),
            subjects: defaults::subjects(),
            subject: defaults::subject(),
            consumer: defaults::consumer(),
            ack_wait_secs: defaults::ack_wait_secs(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_jetstream_defaults() {
        let config: QueueConfig =
            ron::from_str(r#"(type: "JetStream", url: "nats://queue:4222")"#).unwrap();

        let QueueConfig::JetStream(config) = config else {
            panic!("expected JetStream config, got {config:?}");
        };
        assert_eq!(config.url, "nats://queue:4222");
        assert_eq!(config.stream, "EMAILS");
        assert_eq!(config.subjects, vec!["EMAILS.*"]);
        assert_eq!(config.subject, "EMAILS.send");
        assert_eq!(config.consumer, "EMAIL_WORKER");
        assert_eq!(config.ack_wait_secs, 30);
    }

    #[test]
    fn test_memory() {
        let config: QueueConfig = ron::from_str(r#"(type: "Memory")"#).unwrap();
        assert!(matches!(config, QueueConfig::Memory));
    }
}
