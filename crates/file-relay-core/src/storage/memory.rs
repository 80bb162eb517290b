//! In-memory link store.

use super::{LinkStore, StorageError};
use crate::model::LinkRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Link store backed by a process-local map
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    records: RwLock<HashMap<String, LinkRecord>>,
}

impl InMemoryLinkStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current access counter for a token, if the record exists
    pub async fn access_count(&self, link_token: &str) -> Option<u64> {
        self.records
            .read()
            .await
            .get(link_token)
            .map(|record| record.access_count)
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn upsert_link(&self, record: &LinkRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(record.link_token.clone(), record.clone());
        Ok(())
    }

    async fn find_link(&self, link_token: &str) -> Result<Option<LinkRecord>, StorageError> {
        Ok(self.records.read().await.get(link_token).cloned())
    }

    async fn increment_access(&self, link_token: &str) -> Result<(), StorageError> {
        if let Some(record) = self.records.write().await.get_mut(link_token) {
            record.access_count += 1;
        }
        Ok(())
    }

    async fn count_links(&self) -> Result<u64, StorageError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn access_counts(&self) -> Result<Vec<u64>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(|record| record.access_count)
            .collect())
    }

    async fn check_connection(&self) -> Result<(), String> {
        Ok(())
    }
}
