use std::fmt::Debug;

use async_trait::async_trait;

use crate::{OutboundMessage, SendOutcome};

/// A mail provider the delivery worker can hand messages to.
///
/// Implementations classify the provider's answer and never retry on their
/// own; retry decisions belong to the caller.
#[async_trait]
pub trait MailTransport: Send + Sync + Debug {
    async fn send(&self, message: &OutboundMessage) -> SendOutcome;
}
