use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters for the life of the process
///
/// One instance is shared, behind an `Arc`, by every worker loop and the
/// summary reporter. Counters only ever increase.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    processed: AtomicU64,
    throttled: AtomicU64,
    failed: AtomicU64,
}

/// A consistent-enough read of [`WorkerCounters`] for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub processed: u64,
    pub throttled: u64,
    pub failed: u64,
}

impl WorkerCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed: {}, throttled: {}, failed: {}",
            self.processed, self.throttled, self.failed
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_snapshot() {
        let counters = WorkerCounters::new();
        counters.record_processed();
        counters.record_throttled();
        counters.record_throttled();
        counters.record_failed();

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                processed: 1,
                throttled: 2,
                failed: 1,
            }
        );
        assert_eq!(
            counters.snapshot().to_string(),
            "processed: 1, throttled: 2, failed: 1"
        );
    }

    #[test]
    fn test_concurrent_increments() {
        let counters = Arc::new(WorkerCounters::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.record_processed();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.snapshot().processed, 8000);
    }
}
