//! The provider-neutral send request and its classified result.

use std::time::Duration;

use missive_common::BodyKind;

/// An attachment with its content already decoded to raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAttachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Everything a transport needs to send one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Mailbox the message is sent as.
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub body_kind: BodyKind,
    pub attachments: Vec<OutboundAttachment>,
}

/// How the provider answered a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider accepted the message for delivery.
    Accepted,

    /// The provider asked us to slow down.
    ///
    /// `retry_after` is the provider's hint, `None` when it was absent or not
    /// a positive number of seconds.
    Throttled { retry_after: Option<Duration> },

    /// The request never produced a provider verdict (network, timeout,
    /// token acquisition).
    TransientError(String),

    /// Any other provider response.
    PermanentFailure { status: u16, body: String },
}

impl SendOutcome {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl std::fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Throttled {
                retry_after: Some(wait),
            } => write!(f, "throttled (retry after {}s)", wait.as_secs()),
            Self::Throttled { retry_after: None } => write!(f, "throttled"),
            Self::TransientError(reason) => write!(f, "transient error: {reason}"),
            Self::PermanentFailure { status, body } => {
                write!(f, "rejected with status {status}: {body}")
            }
        }
    }
}
