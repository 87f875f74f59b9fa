use std::fmt::Debug;

use async_trait::async_trait;
use missive_common::Sender;

use crate::{DirectoryError, Result};

/// Storage for sender identities, keyed by application tag.
///
/// The delivery pipeline only ever calls [`SenderDirectory::resolve_sender`];
/// the remaining operations back the operator tooling.
#[async_trait]
pub trait SenderDirectory: Send + Sync + Debug {
    /// Find the sender registered for `app_tag`, if any
    ///
    /// # Errors
    /// Returns an error if the backing store could not be queried
    async fn find_by_tag(&self, app_tag: &str) -> Result<Option<Sender>>;

    /// Register a new sender
    ///
    /// # Errors
    /// Returns [`DirectoryError::AlreadyExists`] if the tag is taken
    async fn create(&self, app_tag: &str, email: &str) -> Result<Sender>;

    /// All senders ordered by tag
    ///
    /// # Errors
    /// Returns an error if the backing store could not be queried
    async fn list(&self) -> Result<Vec<Sender>>;

    /// Remove the sender registered for `app_tag`
    ///
    /// Returns whether a sender was removed.
    ///
    /// # Errors
    /// Returns an error if the backing store could not be queried
    async fn delete(&self, app_tag: &str) -> Result<bool>;

    /// Resolve the sending identity for a job's application tag
    ///
    /// # Errors
    /// - [`DirectoryError::EmptyTag`] when `app_tag` is empty
    /// - [`DirectoryError::NotFound`] when nothing is registered for it
    /// - [`DirectoryError::Database`] on any store failure
    async fn resolve_sender(&self, app_tag: &str) -> Result<Sender> {
        if app_tag.is_empty() {
            return Err(DirectoryError::EmptyTag);
        }

        self.find_by_tag(app_tag)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(app_tag.to_string()))
    }
}
