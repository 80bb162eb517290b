//! Link resolution and replay
//!
//! Turns a link token back into its file batch, counts the access, and
//! replays the files through a [`MediaTransport`].

use crate::model::{FileRef, LinkStats};
use crate::storage::{collect_stats, LinkStore, StorageError};
use crate::transport::MediaTransport;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`LinkResolver::resolve`]
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No record exists for the token
    #[error("no media found for link {0}")]
    NotFound(String),
    /// The lookup itself failed
    #[error("link lookup failed: {0}")]
    Storage(#[from] StorageError),
}

/// One file that could not be delivered
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// The file that failed
    pub file: FileRef,
    /// Error reported by the transport
    pub reason: String,
}

/// Per-item outcome of a replay
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    /// Files sent successfully, in order
    pub delivered: Vec<FileRef>,
    /// Files the transport rejected, in order
    pub failed: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// Whether every file was delivered
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolves share links and replays their files
pub struct LinkResolver {
    store: Arc<dyn LinkStore>,
}

impl LinkResolver {
    /// Create a resolver over a link store
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// Look up the files behind `link_token` and count the access.
    ///
    /// A failed counter update is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tokens, or `Storage` if the lookup fails.
    pub async fn resolve(&self, link_token: &str) -> Result<Vec<FileRef>, ResolveError> {
        let record = self
            .store
            .find_link(link_token)
            .await?
            .ok_or_else(|| ResolveError::NotFound(link_token.to_string()))?;

        if let Err(e) = self.store.increment_access(link_token).await {
            warn!(link_token, error = %e, "Failed to increment access counter");
        }

        info!(
            link_token,
            files = record.files.len(),
            "Link resolved."
        );
        Ok(record.files)
    }

    /// Send every file to `chat_id` in order.
    ///
    /// A failed item is logged and recorded; delivery continues with the next one.
    pub async fn deliver(
        &self,
        transport: &dyn MediaTransport,
        chat_id: i64,
        files: Vec<FileRef>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for file in files {
            match transport.send_media(chat_id, &file).await {
                Ok(()) => report.delivered.push(file),
                Err(e) => {
                    warn!(
                        chat_id,
                        kind = %file.kind(),
                        error = %e,
                        "Failed to deliver file"
                    );
                    report.failed.push(DeliveryFailure {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Total links and summed access counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    pub async fn stats(&self) -> Result<LinkStats, StorageError> {
        collect_stats(self.store.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileKind, LinkRecord, UploadSession};
    use crate::storage::MockLinkStore;
    use crate::testing::{mock_store_with, mock_transport_ok};
    use crate::transport::MockMediaTransport;
    use chrono::Utc;

    fn record() -> LinkRecord {
        let mut session = UploadSession::new(1, "file_1_1");
        session.push(FileRef::new(FileKind::Photo, "p", Some("cap".into())));
        session.push(FileRef::new(FileKind::Document, "d", None));
        session.push(FileRef::new(FileKind::Sticker, "s", None));
        LinkRecord::from_session(session, Utc::now())
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let mut mock = MockLinkStore::new();
        mock.expect_find_link().returning(|_| Ok(None));
        mock.expect_increment_access().times(0);

        let resolver = LinkResolver::new(Arc::new(mock));
        let err = resolver.resolve("missing").await.err();
        assert!(matches!(err, Some(ResolveError::NotFound(t)) if t == "missing"));
    }

    #[tokio::test]
    async fn counter_failure_does_not_block_resolution() {
        let mut mock = MockLinkStore::new();
        mock.expect_find_link().returning(|_| Ok(Some(record())));
        mock.expect_increment_access()
            .times(1)
            .returning(|_| Err(StorageError::Config("offline".into())));

        let resolver = LinkResolver::new(Arc::new(mock));
        let files = resolver.resolve("file_1_1").await.expect("resolved");
        assert_eq!(files.len(), 3);
    }

    #[tokio::test]
    async fn deliver_continues_after_failure() {
        let resolver = LinkResolver::new(Arc::new(mock_store_with(record())));
        let mut transport = MockMediaTransport::new();
        transport
            .expect_send_media()
            .times(3)
            .returning(|_, file| {
                if file.kind() == FileKind::Document {
                    Err(anyhow::anyhow!("file is too big"))
                } else {
                    Ok(())
                }
            });

        let report = resolver.deliver(&transport, 77, record().files).await;
        assert!(!report.is_complete());
        assert_eq!(report.delivered.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file.handle(), "d");
        assert!(report.failed[0].reason.contains("too big"));
    }

    #[tokio::test]
    async fn deliver_keeps_order() {
        let resolver = LinkResolver::new(Arc::new(mock_store_with(record())));
        let transport = mock_transport_ok();

        let report = resolver.deliver(&transport, 1, record().files).await;
        assert!(report.is_complete());
        let handles: Vec<&str> = report.delivered.iter().map(FileRef::handle).collect();
        assert_eq!(handles, vec!["p", "d", "s"]);
    }
}
