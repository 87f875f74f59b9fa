//! Periodic log line with queue depth and outcome counters.

use std::{sync::Arc, time::Duration};

use missive_common::{Signal, internal};
use missive_queue::{JobQueue, QueueStats};
use tokio::sync::broadcast;

use crate::{CounterSnapshot, WorkerCounters};

/// Render one summary line; a stats failure is reported in place of the
/// queue depth.
pub fn render(stats: Result<QueueStats, String>, counters: CounterSnapshot) -> String {
    match stats {
        Ok(stats) => format!("Summary: {stats}, {counters}"),
        Err(e) => format!("Summary: could not retrieve queue stats ({e}), {counters}"),
    }
}

/// Logs queue depth and counters on a fixed interval, independently of job
/// processing.
#[derive(Debug, Clone)]
pub struct SummaryReporter {
    queue: Arc<dyn JobQueue>,
    counters: Arc<WorkerCounters>,
    interval: Duration,
}

impl SummaryReporter {
    pub fn new(queue: Arc<dyn JobQueue>, counters: Arc<WorkerCounters>, interval: Duration) -> Self {
        Self {
            queue,
            counters,
            interval,
        }
    }

    /// Build and log one summary line
    pub async fn report(&self) -> String {
        let stats = self.queue.stats().await.map_err(|e| e.to_string());
        let line = render(stats, self.counters.snapshot());
        tracing::info!("{line}");
        line
    }

    /// Report every interval until shutdown
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<Signal>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report().await;
                }
                _ = shutdown.recv() => {
                    internal!("Summary reporter stopping: {}", self.counters.snapshot());
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render() {
        let counters = CounterSnapshot {
            processed: 3,
            throttled: 1,
            failed: 2,
        };

        assert_eq!(
            render(
                Ok(QueueStats {
                    stream_messages: 10,
                    consumer_pending: 4,
                }),
                counters
            ),
            "Summary: stream messages: 10, consumer pending: 4, processed: 3, throttled: 1, failed: 2"
        );
        assert_eq!(
            render(Err("timed out".to_string()), counters),
            "Summary: could not retrieve queue stats (timed out), processed: 3, throttled: 1, failed: 2"
        );
    }
}
