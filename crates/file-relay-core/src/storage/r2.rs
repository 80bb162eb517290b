//! R2 / S3 link store.
//!
//! Each record is a JSON object under `links/<token>.json`. The counter is
//! updated with read-modify-write, so concurrent increments on the same
//! link may be lost.

use super::{LinkStore, StorageError};
use crate::config::RelaySettings;
use crate::model::LinkRecord;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const LINK_PREFIX: &str = "links/";

/// R2-backed link store
pub struct R2LinkStore {
    client: Client,
    bucket: String,
    cache: Cache<String, Arc<Vec<u8>>>,
}

impl R2LinkStore {
    /// Create a new R2 link store
    ///
    /// # Errors
    ///
    /// Returns an error if R2 configuration is missing.
    pub async fn new(settings: &RelaySettings) -> Result<Self, StorageError> {
        let endpoint_url = settings
            .r2_endpoint_url
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ENDPOINT_URL is missing".into()))?;
        let access_key = settings
            .r2_access_key_id
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ACCESS_KEY_ID is missing".into()))?;
        let secret_key = settings
            .r2_secret_access_key
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_SECRET_ACCESS_KEY is missing".into()))?;
        let bucket = settings
            .r2_bucket_name
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_BUCKET_NAME is missing".into()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "r2-storage");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(60 * 60))
            .time_to_idle(Duration::from_secs(30 * 60))
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.clone(),
            cache,
        })
    }

    async fn save_record(&self, record: &LinkRecord) -> Result<(), StorageError> {
        let key = link_key(&record.link_token);
        let body_bytes = serde_json::to_vec_pretty(record)?;

        // Write-through
        self.cache
            .insert(key.clone(), Arc::new(body_bytes.clone()))
            .await;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body_bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        Ok(())
    }

    async fn load_record(&self, key: &str) -> Result<Option<LinkRecord>, StorageError> {
        if let Some(cached) = self.cache.get(key).await {
            match serde_json::from_slice(&cached) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    warn!("Cache deserialization failed for {}: {}", key, e);
                    self.cache.invalidate(key).await;
                }
            }
        }

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
                    .into_bytes();

                self.cache
                    .insert(key.to_string(), Arc::new(data.to_vec()))
                    .await;

                Ok(Some(serde_json::from_slice(&data)?))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StorageError::S3Get(Box::new(e))),
        }
    }

    async fn list_link_keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(LINK_PREFIX)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| StorageError::S3List(e.to_string()))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(ToString::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl LinkStore for R2LinkStore {
    async fn upsert_link(&self, record: &LinkRecord) -> Result<(), StorageError> {
        self.save_record(record).await
    }

    async fn find_link(&self, link_token: &str) -> Result<Option<LinkRecord>, StorageError> {
        self.load_record(&link_key(link_token)).await
    }

    async fn increment_access(&self, link_token: &str) -> Result<(), StorageError> {
        if let Some(mut record) = self.load_record(&link_key(link_token)).await? {
            record.access_count += 1;
            self.save_record(&record).await?;
        }
        Ok(())
    }

    async fn count_links(&self) -> Result<u64, StorageError> {
        Ok(self.list_link_keys().await?.len() as u64)
    }

    async fn access_counts(&self) -> Result<Vec<u64>, StorageError> {
        let mut counts = Vec::new();
        for key in self.list_link_keys().await? {
            if let Some(record) = self.load_record(&key).await? {
                counts.push(record.access_count);
            }
        }
        Ok(counts)
    }

    async fn check_connection(&self) -> Result<(), String> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Successfully connected to R2 storage.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("R2 connectivity test failed: {e:#?}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Returns the R2 key for a link record
#[must_use]
pub fn link_key(link_token: &str) -> String {
    format!("{LINK_PREFIX}{link_token}.json")
}
