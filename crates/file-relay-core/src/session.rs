//! Upload sessions
//!
//! [`SessionStore`] holds at most one in-progress batch per admin.
//! [`SessionController`] drives the `Idle -> Collecting -> Idle` cycle and
//! commits finished batches to the link store.

use crate::model::{
    generate_link_token, should_report_progress, tally_kinds, FileRef, KindTally, LinkRecord,
    UploadSession,
};
use crate::storage::{LinkStore, StorageError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors returned when finishing an upload
#[derive(Error, Debug)]
pub enum SessionError {
    /// The owner has no open session
    #[error("no active upload session")]
    NoActiveSession,
    /// The batch could not be committed
    #[error("failed to commit upload: {0}")]
    Storage(#[from] StorageError),
}

/// In-memory registry of open upload sessions, keyed by owner id.
///
/// Lives for the whole process; nothing here is persisted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, UploadSession>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session, returning the one it replaced
    pub async fn open(&self, session: UploadSession) -> Option<UploadSession> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.owner_id(), session)
    }

    /// Append to the owner's session; `None` when no session is open
    pub async fn append(&self, owner_id: i64, file: FileRef) -> Option<usize> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(&owner_id).map(|session| session.push(file))
    }

    /// Remove and return the owner's session
    pub async fn take(&self, owner_id: i64) -> Option<UploadSession> {
        self.sessions.lock().await.remove(&owner_id)
    }

    /// Put a session back unless a newer one was opened meanwhile
    pub async fn restore(&self, session: UploadSession) {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(session.owner_id()).or_insert(session);
    }

    /// Whether the owner has an open session
    pub async fn contains(&self, owner_id: i64) -> bool {
        self.sessions.lock().await.contains_key(&owner_id)
    }

    /// Number of open sessions
    pub async fn open_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop every open session
    pub async fn clear(&self) {
        self.sessions.lock().await.clear();
    }
}

/// Result of appending a file to an open session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Files in the session after the append
    pub count: usize,
    /// Whether the admin should get a progress notice for this file
    pub report_progress: bool,
}

/// Result of finishing a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOutcome {
    /// Token the batch was (or would have been) committed under
    pub link_token: String,
    /// Number of committed files; zero means nothing was committed
    pub total: usize,
    /// Per-kind counts of the committed files
    pub tally: KindTally,
}

impl FinishOutcome {
    /// Whether a link record was written
    #[must_use]
    pub const fn committed(&self) -> bool {
        self.total > 0
    }
}

/// Drives the admin upload flow
pub struct SessionController {
    sessions: SessionStore,
    store: Arc<dyn LinkStore>,
}

impl SessionController {
    /// Create a controller with an empty session store
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            sessions: SessionStore::new(),
            store,
        }
    }

    /// Open a fresh session for `owner_id` and return its link token.
    ///
    /// Any previous session of the same owner is discarded without merging.
    /// The caller is responsible for checking that the owner is an admin.
    pub async fn start_upload(&self, owner_id: i64) -> String {
        let link_token = generate_link_token(owner_id, Utc::now());
        let replaced = self
            .sessions
            .open(UploadSession::new(owner_id, link_token.clone()))
            .await;

        if let Some(previous) = replaced {
            info!(
                owner_id,
                discarded_files = previous.len(),
                "Upload session restarted; previous batch discarded."
            );
        } else {
            info!(owner_id, link_token = %link_token, "Upload session started.");
        }
        link_token
    }

    /// Add a file to the owner's session.
    ///
    /// Returns `None` without error when no session is open.
    pub async fn append_file(&self, owner_id: i64, file: FileRef) -> Option<AppendOutcome> {
        let kind = file.kind();
        let Some(count) = self.sessions.append(owner_id, file).await else {
            debug!(owner_id, %kind, "Media outside an upload session ignored.");
            return None;
        };
        debug!(owner_id, %kind, count, "File added to upload session.");
        Some(AppendOutcome {
            count,
            report_progress: should_report_progress(count),
        })
    }

    /// Close the owner's session and commit its files.
    ///
    /// An empty session is removed without writing anything. If the write
    /// fails, the session is put back so the admin can retry.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` if no session is open, or `Storage` if the
    /// commit fails.
    pub async fn finish_upload(&self, owner_id: i64) -> Result<FinishOutcome, SessionError> {
        let session = self
            .sessions
            .take(owner_id)
            .await
            .ok_or(SessionError::NoActiveSession)?;

        let link_token = session.link_token().to_string();
        if session.is_empty() {
            info!(owner_id, "Upload session finished without files.");
            return Ok(FinishOutcome {
                link_token,
                total: 0,
                tally: KindTally::new(),
            });
        }

        let tally = tally_kinds(session.files());
        let record = LinkRecord::from_session(session.clone(), Utc::now());
        if let Err(e) = self.store.upsert_link(&record).await {
            self.sessions.restore(session).await;
            return Err(e.into());
        }

        info!(
            owner_id,
            link_token = %link_token,
            total = record.files.len(),
            "Upload committed."
        );
        Ok(FinishOutcome {
            link_token,
            total: record.files.len(),
            tally,
        })
    }

    /// Whether the owner is currently collecting files
    pub async fn has_session(&self, owner_id: i64) -> bool {
        self.sessions.contains(owner_id).await
    }

    /// Number of open sessions
    pub async fn active_sessions(&self) -> usize {
        self.sessions.open_count().await
    }

    /// Drop every open session, e.g. on shutdown
    pub async fn clear(&self) {
        self.sessions.clear().await;
    }
}
