//! Outbound media transport.
//!
//! Implemented by each chat platform adapter; the resolver only knows how to
//! hand it one [`FileRef`] at a time.

use crate::model::FileRef;
use anyhow::Result;
use async_trait::async_trait;

/// Sends stored media back to a user
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Send one file to `chat_id` with the send primitive matching its kind
    async fn send_media(&self, chat_id: i64, file: &FileRef) -> Result<()>;
}
