use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use missive_common::Sender;

use crate::{DirectoryError, Result, r#trait::SenderDirectory};

/// In-memory sender directory
///
/// Ids are assigned sequentially from 1, like the `SERIAL` column of the
/// Postgres table. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemorySenderDirectory {
    senders: Arc<DashMap<String, Sender>>,
    next_id: Arc<AtomicI64>,
}

impl MemorySenderDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory pre-populated with `(app_tag, email)` pairs
    ///
    /// Later duplicates of a tag are ignored.
    pub fn with_senders<'a>(senders: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let directory = Self::new();
        for (app_tag, email) in senders {
            directory.insert(app_tag, email);
        }
        directory
    }

    fn insert(&self, app_tag: &str, email: &str) -> Option<Sender> {
        match self.senders.entry(app_tag.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let sender = Sender {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    app_tag: app_tag.to_string(),
                    email: email.to_string(),
                };
                slot.insert(sender.clone());
                Some(sender)
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[async_trait]
impl SenderDirectory for MemorySenderDirectory {
    async fn find_by_tag(&self, app_tag: &str) -> Result<Option<Sender>> {
        Ok(self.senders.get(app_tag).map(|entry| entry.value().clone()))
    }

    async fn create(&self, app_tag: &str, email: &str) -> Result<Sender> {
        self.insert(app_tag, email)
            .ok_or_else(|| DirectoryError::AlreadyExists(app_tag.to_string()))
    }

    async fn list(&self) -> Result<Vec<Sender>> {
        let mut senders: Vec<_> = self
            .senders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        senders.sort_by(|a, b| a.app_tag.cmp(&b.app_tag));
        Ok(senders)
    }

    async fn delete(&self, app_tag: &str) -> Result<bool> {
        Ok(self.senders.remove(app_tag).is_some())
    }
}
