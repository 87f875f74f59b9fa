use serde::Serialize;

/// Point-in-time depth of the job queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Messages currently stored in the stream.
    pub stream_messages: u64,
    /// Messages not yet delivered to the shared consumer.
    pub consumer_pending: u64,
}

impl std::fmt::Display for QueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stream messages: {}, consumer pending: {}",
            self.stream_messages, self.consumer_pending
        )
    }
}
