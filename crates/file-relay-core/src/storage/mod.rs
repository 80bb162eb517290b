//! Storage layer for link records
//!
//! [`LinkStore`] is the keyed-document contract the resolver and session
//! controller depend on. Backends: MongoDB (primary), R2 / S3 JSON objects,
//! and an in-memory map for tests and local runs.

mod memory;
mod mongo;
mod r2;

pub use memory::InMemoryLinkStore;
pub use mongo::MongoLinkStore;
pub use r2::R2LinkStore;

use crate::config::{RelaySettings, StorageBackend};
use crate::model::{LinkRecord, LinkStats};
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// MongoDB driver error
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    /// Record could not be converted to BSON
    #[error("BSON encode error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    /// Error retrieving object from S3
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    /// Error putting object into S3
    #[error("S3 put error: {0}")]
    S3Put(String),
    /// Error listing objects in S3
    #[error("S3 list error: {0}")]
    S3List(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error (missing credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Keyed document store for link records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert or fully replace the record stored under `record.link_token`
    async fn upsert_link(&self, record: &LinkRecord) -> Result<(), StorageError>;
    /// Point lookup by link token
    async fn find_link(&self, link_token: &str) -> Result<Option<LinkRecord>, StorageError>;
    /// Increment the access counter of an existing record
    async fn increment_access(&self, link_token: &str) -> Result<(), StorageError>;
    /// Number of stored records
    async fn count_links(&self) -> Result<u64, StorageError>;
    /// Access counter of every stored record (full scan)
    async fn access_counts(&self) -> Result<Vec<u64>, StorageError>;
    /// Check connection to storage
    async fn check_connection(&self) -> Result<(), String>;
}

/// Total links and summed accesses across the store.
///
/// # Errors
///
/// Returns an error if counting or scanning fails.
pub async fn collect_stats(store: &dyn LinkStore) -> Result<LinkStats, StorageError> {
    let total_links = store.count_links().await?;
    let total_accesses = store.access_counts().await?.into_iter().sum();
    Ok(LinkStats {
        total_links,
        total_accesses,
    })
}

/// Connect to the backend selected in settings.
///
/// # Errors
///
/// Returns an error if the backend is misconfigured or unreachable.
pub async fn connect(settings: &RelaySettings) -> Result<Arc<dyn LinkStore>, StorageError> {
    let store: Arc<dyn LinkStore> = match settings.storage_backend {
        StorageBackend::Mongodb => Arc::new(MongoLinkStore::new(settings).await?),
        StorageBackend::R2 => Arc::new(R2LinkStore::new(settings).await?),
        StorageBackend::Memory => {
            info!("Using in-memory link store; links will not survive a restart.");
            Arc::new(InMemoryLinkStore::new())
        }
    };
    Ok(store)
}
