//! Retry policy for send attempts within a single delivery.

use std::time::Duration;

use serde::Deserialize;

/// How many times to try a job and how long to wait in between.
///
/// Both throttled and transient attempts count against `max_attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Send attempts per delivery.
    ///
    /// Default: 3
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Wait after a transient failure is `base + attempt_index` seconds,
    /// so 2, 3 and 4 seconds with the default.
    ///
    /// Default: 2 seconds
    #[serde(default = "defaults::transient_backoff_base_secs")]
    pub transient_backoff_base_secs: u64,

    /// Wait after a throttled attempt when the provider gives no usable hint.
    ///
    /// Default: 5 seconds
    #[serde(default = "defaults::default_throttle_wait_secs")]
    pub default_throttle_wait_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            transient_backoff_base_secs: defaults::transient_backoff_base_secs(),
            default_throttle_wait_secs: defaults::default_throttle_wait_secs(),
        }
    }
}

impl RetryPolicy {
    /// Wait after a transient failure on the zero-based `attempt_index`
    #[must_use]
    pub fn transient_backoff(&self, attempt_index: u32) -> Duration {
        Duration::from_secs(self.transient_backoff_base_secs + u64::from(attempt_index))
    }

    /// Wait after a throttled attempt, honouring the provider's hint
    #[must_use]
    pub fn throttle_wait(&self, retry_after: Option<Duration>) -> Duration {
        retry_after
            .filter(|wait| !wait.is_zero())
            .unwrap_or_else(|| Duration::from_secs(self.default_throttle_wait_secs))
    }
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn transient_backoff_base_secs() -> u64 {
        2
    }

    pub const fn default_throttle_wait_secs() -> u64 {
        5
    }
}
