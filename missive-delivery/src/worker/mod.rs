//! Delivery worker orchestration

mod process;
pub mod summary;

use std::{sync::Arc, time::Duration};

use missive_common::{Signal, internal};
use missive_directory::SenderDirectory;
use missive_queue::JobQueue;
use missive_tracing::traced;
use missive_transport::MailTransport;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{RetryPolicy, WorkerCounters};

const fn default_concurrency() -> usize {
    1
}

const fn default_fetch_timeout() -> u64 {
    10
}

const fn default_fetch_error_pause() -> u64 {
    2
}

const fn default_summary_interval() -> u64 {
    30
}

/// Settings for the worker pool of one process
///
/// ```ron
/// worker: (
///     concurrency: 4,
///     retry: (max_attempts: 3),
/// ),
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerConfig {
    /// Fetch/process loops run by this process
    ///
    /// Default: 1
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Longest a single fetch waits for a message (in seconds)
    ///
    /// Default: 10 seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Pause after a failed fetch (in seconds)
    ///
    /// Default: 2 seconds
    #[serde(default = "default_fetch_error_pause")]
    pub fetch_error_pause_secs: u64,

    /// How often counters and queue depth are logged (in seconds)
    ///
    /// Default: 30 seconds
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout(),
            fetch_error_pause_secs: default_fetch_error_pause(),
            summary_interval_secs: default_summary_interval(),
            retry: RetryPolicy::default(),
        }
    }
}

/// One fetch/process loop over the shared job queue
///
/// Clones share the queue, directory, transport and counters, so a pool is
/// built by cloning one worker per loop.
#[derive(Debug, Clone)]
pub struct DeliveryWorker {
    config: WorkerConfig,
    queue: Arc<dyn JobQueue>,
    directory: Arc<dyn SenderDirectory>,
    transport: Arc<dyn MailTransport>,
    counters: Arc<WorkerCounters>,
}

impl DeliveryWorker {
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn JobQueue>,
        directory: Arc<dyn SenderDirectory>,
        transport: Arc<dyn MailTransport>,
        counters: Arc<WorkerCounters>,
    ) -> Self {
        Self {
            config,
            queue,
            directory,
            transport,
            counters,
        }
    }

    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn counters(&self) -> &Arc<WorkerCounters> {
        &self.counters
    }

    /// Pull and process jobs until shutdown
    ///
    /// A job that is already being processed when the shutdown signal
    /// arrives is finished, including its ack or nak, before the loop exits.
    #[traced(instrument(level = tracing::Level::TRACE, skip(self, shutdown)), timing(precision = "s"))]
    pub async fn serve(&self, id: usize, mut shutdown: broadcast::Receiver<Signal>) {
        internal!("Delivery worker {id} starting");

        let fetch_timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let error_pause = Duration::from_secs(self.config.fetch_error_pause_secs);

        loop {
            let fetched = tokio::select! {
                biased;

                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            internal!("Delivery worker {id} received shutdown signal");
                        }
                        Err(e) => {
                            tracing::error!("Delivery worker {id} shutdown channel error: {e}");
                        }
                    }
                    break;
                }
                fetched = self.queue.fetch(fetch_timeout) => fetched,
            };

            match fetched {
                Ok(Some(job)) => self.process_job(job).await,
                Ok(None) => tracing::trace!("Delivery worker {id}: no job within {fetch_timeout:?}"),
                Err(e) => {
                    tracing::warn!("Delivery worker {id}: {e}, pausing for {error_pause:?}");
                    tokio::select! {
                        biased;

                        _ = shutdown.recv() => break,
                        () = tokio::time::sleep(error_pause) => {}
                    }
                }
            }
        }

        internal!("Delivery worker {id} stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: WorkerConfig = ron::from_str("()").unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.fetch_error_pause_secs, 2);
        assert_eq!(config.summary_interval_secs, 30);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_config_overrides() {
        let config: WorkerConfig =
            ron::from_str("(concurrency: 4, retry: (default_throttle_wait_secs: 10))").unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retry.default_throttle_wait_secs, 10);
        assert_eq!(config.retry.max_attempts, 3);
    }
}
