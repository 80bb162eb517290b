//! Telegram transport settings.

use config::ConfigError;
use file_relay_core::config::RelaySettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Long-poll timeout for `getUpdates`.
pub const POLLING_TIMEOUT_SECS: u64 = 30;
/// Fixed delay before polling again after a failure. Retries never stop.
pub const POLLING_RETRY_DELAY_SECS: u64 = 5;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token (`TELEGRAM_TOKEN`).
    #[serde(default)]
    pub telegram_token: String,
    /// Legacy name of the token (`BOT_TOKEN`), used when `TELEGRAM_TOKEN` is unset.
    pub bot_token: Option<String>,
    /// Comma-separated list of admin user IDs.
    #[serde(rename = "admin_ids")]
    pub admin_ids_str: Option<String>,
    /// Channel button on the user welcome menu.
    pub channel_url: Option<String>,
    /// Website button on the user welcome menu.
    pub website_url: Option<String>,
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Link store settings.
    pub relay: Arc<RelaySettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(relay: RelaySettings, telegram: TelegramSettings) -> Self {
        Self {
            relay: Arc::new(relay),
            telegram: Arc::new(telegram),
        }
    }
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or no token is set.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = file_relay_core::config::build_config()?.try_deserialize()?;
        settings.with_resolved_token()
    }

    /// Fall back to `bot_token` when `telegram_token` is empty.
    fn with_resolved_token(mut self) -> Result<Self, ConfigError> {
        if self.telegram_token.trim().is_empty() {
            match self.bot_token.take().filter(|t| !t.trim().is_empty()) {
                Some(token) => self.telegram_token = token,
                None => return Err(ConfigError::NotFound("telegram_token".to_string())),
            }
        }
        Ok(self)
    }

    /// Returns the set of admin user IDs.
    #[must_use]
    pub fn admin_ids(&self) -> HashSet<i64> {
        self.admin_ids_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
