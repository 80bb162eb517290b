//! Configuration and settings management
//!
//! Loads storage settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Default MongoDB database name
pub const DEFAULT_DATABASE_NAME: &str = "telegram_bot_db";
/// Default MongoDB collection for link records
pub const DEFAULT_COLLECTION_NAME: &str = "shared_files";

/// Build the layered configuration shared by every settings struct.
///
/// Sources, later ones win: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__*` environment variables, plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE is mapped to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Which link store backend to connect to.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// MongoDB collection (default)
    #[default]
    Mongodb,
    /// Cloudflare R2 / S3 bucket with one JSON object per link
    R2,
    /// Process memory; records are lost on restart
    Memory,
}

/// Storage settings for link records.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelaySettings {
    /// Backend selector (`STORAGE_BACKEND`)
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// MongoDB connection string
    pub mongodb_uri: Option<String>,
    /// MongoDB database name
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// MongoDB collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// R2 Storage access key ID
    pub r2_access_key_id: Option<String>,
    /// R2 Storage secret access key
    pub r2_secret_access_key: Option<String>,
    /// R2 Storage endpoint URL
    pub r2_endpoint_url: Option<String>,
    /// R2 Storage bucket name
    pub r2_bucket_name: Option<String>,
}

fn default_database_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::default(),
            mongodb_uri: None,
            database_name: default_database_name(),
            collection_name: default_collection_name(),
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_endpoint_url: None,
            r2_bucket_name: None,
        }
    }
}

impl RelaySettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use file_relay_core::config::RelaySettings;
    ///
    /// let settings = RelaySettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }
}
