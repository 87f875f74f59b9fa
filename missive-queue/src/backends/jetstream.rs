use std::time::Duration;

use async_nats::{
    ConnectOptions,
    jetstream::{
        self, AckKind, Context,
        consumer::{AckPolicy, Consumer, pull},
        stream::{self, Stream},
    },
};
use async_trait::async_trait;
use futures_util::StreamExt;
use missive_common::internal;

use crate::{
    JetStreamConfig, QueueError, QueueStats, Result,
    r#trait::{JobQueue, QueuedJob},
};

/// Job queue on a NATS JetStream stream with a durable pull consumer.
///
/// Every worker process binds to the same consumer, so the server hands each
/// message to exactly one of them at a time.
#[derive(Debug)]
pub struct JetStreamQueue {
    context: Context,
    stream: Stream,
    consumer: Consumer<pull::Config>,
    subject: String,
}

impl JetStreamQueue {
    /// Connect to the server, then create or reuse the stream and consumer
    ///
    /// # Errors
    /// Returns [`QueueError::Connect`] or [`QueueError::Setup`]
    pub async fn connect(config: &JetStreamConfig) -> Result<Self> {
        let mut options = ConnectOptions::new();
        if let Some(name) = &config.name {
            options = options.name(name);
        }
        if let Some(token) = &config.token {
            options = options.token(token.clone());
        }
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options = options.user_and_password(username.clone(), password.clone());
        }

        let client = options
            .connect(config.url.as_str())
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        internal!("Connected to NATS at {}", config.url);

        let context = jetstream::new(client);
        let stream = Self::ensure_stream(&context, config).await?;

        let consumer = stream
            .get_or_create_consumer(
                &config.consumer,
                pull::Config {
                    durable_name: Some(config.consumer.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                QueueError::Setup(format!("consumer {}: {e}", config.consumer))
            })?;
        internal!(
            "Bound to consumer {} on stream {}",
            config.consumer,
            config.stream
        );

        Ok(Self {
            context,
            stream,
            consumer,
            subject: config.subject.clone(),
        })
    }

    async fn ensure_stream(context: &Context, config: &JetStreamConfig) -> Result<Stream> {
        let created = context
            .get_or_create_stream(stream::Config {
                name: config.stream.clone(),
                subjects: config.subjects.clone(),
                ..Default::default()
            })
            .await;

        match created {
            Ok(stream) => Ok(stream),
            // Another process may have created it with a different config
            Err(err) => {
                tracing::warn!(
                    "Could not create stream {}: {err}, using the existing one",
                    config.stream
                );
                context
                    .get_stream(&config.stream)
                    .await
                    .map_err(|e| QueueError::Setup(format!("stream {}: {e}", config.stream)))
            }
        }
    }
}

#[async_trait]
impl JobQueue for JetStreamQueue {
    async fn fetch(&self, max_wait: Duration) -> Result<Option<Box<dyn QueuedJob>>> {
        let mut batch = self
            .consumer
            .batch()
            .max_messages(1)
            .expires(max_wait)
            .messages()
            .await
            .map_err(|e| QueueError::Fetch(e.to_string()))?;

        match batch.next().await {
            None => Ok(None),
            Some(Ok(message)) => {
                let delivery_count = message
                    .info()
                    .map(|info| u64::try_from(info.delivered).unwrap_or_default())
                    .unwrap_or(1);

                Ok(Some(Box::new(JetStreamJob {
                    message,
                    delivery_count,
                })))
            }
            Some(Err(e)) => Err(QueueError::Fetch(e.to_string())),
        }
    }

    async fn stats(&self) -> Result<QueueStats> {
        let mut stream = self.stream.clone();
        let stream_messages = stream
            .info()
            .await
            .map_err(|e| QueueError::Stats(e.to_string()))?
            .state
            .messages;

        let mut consumer = self.consumer.clone();
        let consumer_pending = consumer
            .info()
            .await
            .map_err(|e| QueueError::Stats(e.to_string()))?
            .num_pending;

        Ok(QueueStats {
            stream_messages,
            consumer_pending,
        })
    }

    async fn publish_payload(&self, payload: Vec<u8>) -> Result<()> {
        self.context
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;

        Ok(())
    }
}

#[derive(Debug)]
struct JetStreamJob {
    message: jetstream::Message,
    delivery_count: u64,
}

#[async_trait]
impl QueuedJob for JetStreamJob {
    fn payload(&self) -> &[u8] {
        &self.message.payload
    }

    fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    async fn ack(&self) -> Result<()> {
        self.message
            .ack()
            .await
            .map_err(|e| QueueError::Ack(e.to_string()))
    }

    async fn nak(&self) -> Result<()> {
        self.message
            .ack_with(AckKind::Nak(None))
            .await
            .map_err(|e| QueueError::Ack(e.to_string()))
    }
}
