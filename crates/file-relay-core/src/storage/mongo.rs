//! MongoDB link store.
//!
//! One document per link, keyed by `media_id`:
//! `{media_id, files: [{type, file_id, caption?}], created_at, created_by, total_files, access_count}`.

use super::{LinkStore, StorageError};
use crate::config::RelaySettings;
use crate::model::{FileRef, LinkRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, to_document, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, UpdateOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info};

#[derive(Debug, Serialize, Deserialize)]
struct LinkDocument {
    media_id: String,
    files: Vec<FileRef>,
    created_at: BsonDateTime,
    created_by: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    total_files: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    access_count: i64,
}

impl From<&LinkRecord> for LinkDocument {
    fn from(record: &LinkRecord) -> Self {
        Self {
            media_id: record.link_token.clone(),
            files: record.files.clone(),
            created_at: BsonDateTime::from_millis(record.created_at.timestamp_millis()),
            created_by: record.created_by,
            total_files: i64::try_from(record.total_files).unwrap_or(i64::MAX),
            access_count: i64::try_from(record.access_count).unwrap_or(i64::MAX),
        }
    }
}

impl From<LinkDocument> for LinkRecord {
    fn from(document: LinkDocument) -> Self {
        Self {
            link_token: document.media_id,
            files: document.files,
            created_at: DateTime::<Utc>::from_timestamp_millis(document.created_at.timestamp_millis())
                .unwrap_or_default(),
            created_by: document.created_by,
            total_files: u64::try_from(document.total_files).unwrap_or_default(),
            access_count: u64::try_from(document.access_count).unwrap_or_default(),
        }
    }
}

/// MongoDB-backed link store
pub struct MongoLinkStore {
    database: Database,
    links: Collection<LinkDocument>,
}

impl MongoLinkStore {
    /// Connect and make sure the collection indexes exist
    ///
    /// # Errors
    ///
    /// Returns an error if `MONGODB_URI` is missing, the URI is invalid, or index creation fails.
    pub async fn new(settings: &RelaySettings) -> Result<Self, StorageError> {
        let uri = settings
            .mongodb_uri
            .as_ref()
            .ok_or_else(|| StorageError::Config("MONGODB_URI is missing".into()))?;

        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("file-relay-bot".to_string());
        let client = Client::with_options(options)?;

        let database = client.database(&settings.database_name);
        let links = database.collection::<LinkDocument>(&settings.collection_name);

        let store = Self { database, links };
        store.ensure_indexes().await?;
        info!(
            database = %settings.database_name,
            collection = %settings.collection_name,
            "MongoDB link store initialized."
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let by_token = IndexModel::builder()
            .keys(doc! { "media_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let by_date = IndexModel::builder().keys(doc! { "created_at": 1 }).build();

        self.links.create_index(by_token, None).await?;
        self.links.create_index(by_date, None).await?;
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MongoLinkStore {
    async fn upsert_link(&self, record: &LinkRecord) -> Result<(), StorageError> {
        // Full replace: files, owner, timestamp and counter are all reset
        let document = to_document(&LinkDocument::from(record))?;
        self.links
            .update_one(
                doc! { "media_id": &record.link_token },
                doc! { "$set": document },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn find_link(&self, link_token: &str) -> Result<Option<LinkRecord>, StorageError> {
        let found = self
            .links
            .find_one(doc! { "media_id": link_token }, None)
            .await?;
        Ok(found.map(LinkRecord::from))
    }

    async fn increment_access(&self, link_token: &str) -> Result<(), StorageError> {
        self.links
            .update_one(
                doc! { "media_id": link_token },
                doc! { "$inc": { "access_count": 1_i64 } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn count_links(&self) -> Result<u64, StorageError> {
        Ok(self.links.count_documents(doc! {}, None).await?)
    }

    async fn access_counts(&self) -> Result<Vec<u64>, StorageError> {
        let options = FindOptions::builder()
            .projection(doc! { "access_count": 1 })
            .build();
        let mut cursor = self
            .links
            .clone_with_type::<Document>()
            .find(doc! {}, options)
            .await?;

        let mut counts = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            counts.push(access_count_of(&document));
        }
        Ok(counts)
    }

    async fn check_connection(&self) -> Result<(), String> {
        match self.database.run_command(doc! { "ping": 1 }, None).await {
            Ok(_) => {
                info!("Successfully connected to MongoDB.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("MongoDB connectivity test failed: {e}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Older documents may hold counters as 32-bit ints or doubles.
fn count_from_bson(value: &Bson) -> i64 {
    match value {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        #[allow(clippy::cast_possible_truncation)]
        Bson::Double(n) => *n as i64,
        _ => 0,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_bson(&Bson::deserialize(deserializer)?))
}

fn access_count_of(document: &Document) -> u64 {
    let raw = document.get("access_count").map_or(0, count_from_bson);
    u64::try_from(raw).unwrap_or_default()
}
