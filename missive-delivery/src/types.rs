use std::time::Duration;

use missive_transport::SendOutcome;

/// One unsuccessful send attempt within a delivery, kept only for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    /// 1-based attempt number
    pub number: u32,
    pub outcome: SendOutcome,
    /// Pause before the next attempt
    pub wait: Duration,
}

impl std::fmt::Display for DeliveryAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempt {}: {}, waiting {}s",
            self.number,
            self.outcome,
            self.wait.as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_attempt_and_wait() {
        let attempt = DeliveryAttempt {
            number: 2,
            outcome: SendOutcome::Throttled {
                retry_after: Some(Duration::from_secs(7)),
            },
            wait: Duration::from_secs(7),
        };

        let line = attempt.to_string();
        assert!(line.starts_with("attempt 2: "), "{line}");
        assert!(line.ends_with(", waiting 7s"), "{line}");
    }
}
