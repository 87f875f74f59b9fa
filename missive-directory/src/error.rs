//! Error types for sender directory operations.

use thiserror::Error;

/// Top-level directory error type.
///
/// Every variant is final for the job that triggered the lookup: a job whose
/// sender cannot be resolved is never retried.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Lookups require a non-empty application tag.
    #[error("Application tag must not be empty")]
    EmptyTag,

    /// No sender is registered for the tag.
    #[error("No sender registered for application tag: {0}")]
    NotFound(String),

    /// A sender is already registered for the tag.
    #[error("A sender is already registered for application tag: {0}")]
    AlreadyExists(String),

    /// Connectivity or query failure in the backing database.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Specialized `Result` type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
