use missive_common::{EmailJob, outgoing};
use missive_queue::QueuedJob;
use missive_transport::{OutboundMessage, SendOutcome};
use tracing::{Instrument, Span, field};
use ulid::Ulid;

use crate::{
    DeliveryAttempt, DeliveryError, TemporaryError, decode_attachments, worker::DeliveryWorker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Ack,
    Nak,
}

impl DeliveryWorker {
    /// Run one pulled message through the delivery state machine
    ///
    /// Counts exactly one of processed or failed, then acks the message, or
    /// naks it when the failure may clear up on a later delivery.
    pub async fn process_job(&self, job: Box<dyn QueuedJob>) {
        let span = tracing::info_span!(
            "delivery",
            delivery_id = %Ulid::new(),
            delivery_count = job.delivery_count(),
            app_tag = field::Empty,
            sender = field::Empty,
            trace_context = field::Empty,
        );

        async move {
            let verdict = match self.deliver(job.payload()).await {
                Ok(()) => {
                    self.counters.record_processed();
                    Verdict::Ack
                }
                Err(err) => {
                    self.counters.record_failed();
                    if err.is_temporary() {
                        tracing::error!("Delivery failed, returning job to the queue: {err}");
                        Verdict::Nak
                    } else {
                        tracing::error!("Delivery failed permanently, dropping job: {err}");
                        Verdict::Ack
                    }
                }
            };

            settle(job.as_ref(), verdict).await;
        }
        .instrument(span)
        .await;
    }

    async fn deliver(&self, payload: &[u8]) -> Result<(), DeliveryError> {
        let job = EmailJob::from_slice(payload)?;

        let span = Span::current();
        span.record("app_tag", job.app_tag.as_str());
        if let Some(context) = &job.trace_context {
            span.record("trace_context", field::debug(context));
        }

        let sender = self.directory.resolve_sender(&job.app_tag).await?;
        span.record("sender", sender.email.as_str());

        let (body, body_kind) = job.body();
        let attachments = decode_attachments(&job.attachments)?;

        let message = OutboundMessage {
            from: sender.email,
            to: job.recipients.clone(),
            cc: job.cc_recipients.clone(),
            bcc: job.bcc_recipients.clone(),
            subject: job.subject.clone(),
            body: body.to_string(),
            body_kind,
            attachments,
        };

        tracing::debug!(
            "Sending to {} as {}",
            job.all_recipients().join(", "),
            message.from
        );

        self.send_with_retries(&message).await?;
        Ok(())
    }

    async fn send_with_retries(&self, message: &OutboundMessage) -> Result<(), TemporaryError> {
        let policy = &self.config.retry;
        let mut last = None;

        for index in 0..policy.max_attempts {
            let number = index + 1;
            let outcome = self.transport.send(message).await;

            let wait = match &outcome {
                SendOutcome::Accepted => {
                    outgoing!(level = INFO, "Message accepted on attempt {number}");
                    return Ok(());
                }
                SendOutcome::Throttled { retry_after } => {
                    self.counters.record_throttled();
                    policy.throttle_wait(*retry_after)
                }
                SendOutcome::TransientError(_) => policy.transient_backoff(index),
                SendOutcome::PermanentFailure { status, body } => {
                    return Err(TemporaryError::ProviderRejected {
                        status: *status,
                        body: body.clone(),
                    });
                }
            };

            let record = DeliveryAttempt {
                number,
                outcome,
                wait,
            };
            tracing::warn!(attempt = number, "{record}");

            tokio::time::sleep(wait).await;
            last = Some(record.outcome);
        }

        Err(TemporaryError::RetriesExhausted {
            attempts: policy.max_attempts,
            last: last.map_or_else(|| "no attempt made".to_string(), |o| o.to_string()),
        })
    }
}

async fn settle(job: &dyn QueuedJob, verdict: Verdict) {
    let result = match verdict {
        Verdict::Ack => job.ack().await,
        Verdict::Nak => job.nak().await,
    };

    // The queue redelivers after its ack-wait either way
    if let Err(e) = result {
        tracing::warn!("Could not {verdict:?} job: {e}");
    }
}
