use thiserror::Error;

/// Failures inside a transport before a provider verdict is available.
///
/// None of these reach the delivery worker directly: [`crate::MailTransport::send`]
/// folds them into [`crate::SendOutcome::TransientError`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be built or the request failed to complete.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The identity provider refused to issue a token.
    #[error("Token request rejected with status {status}: {body}")]
    Auth { status: u16, body: String },

    /// The transport configuration is unusable.
    #[error("Invalid transport configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
