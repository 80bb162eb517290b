//! Inbound event routing
//!
//! Transports translate platform updates into [`InboundEvent`]s and render
//! the returned [`Reply`]. Routing, admin checks and session state live here.

use crate::model::{FileRef, KindTally, LinkStats};
use crate::resolver::{DeliveryReport, LinkResolver, ResolveError};
use crate::session::{SessionController, SessionError};
use crate::storage::{LinkStore, StorageError};
use crate::transport::MediaTransport;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Events a transport can feed into the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Start command, with the deep-link payload if one was given
    Start {
        /// Link token from the start parameter
        payload: Option<String>,
    },
    /// Upload command or upload button
    UploadTrigger,
    /// Done button or command
    FinishTrigger,
    /// A media message
    Media(FileRef),
    /// Statistics request
    Stats,
    /// Help request
    Help,
    /// Any other text
    Text(String),
}

/// What the transport should tell the user
#[derive(Debug, Clone)]
pub enum Reply {
    /// Link files were replayed
    Delivered {
        /// Per-item outcome
        report: DeliveryReport,
    },
    /// The link token is unknown
    LinkNotFound,
    /// Welcome menu for admins
    AdminMenu,
    /// Welcome menu for everyone else
    UserMenu,
    /// Upload mode activated
    UploadStarted,
    /// Admin-only action attempted by a non-admin
    Unauthorized,
    /// Progress notice while collecting
    Progress {
        /// Files collected so far
        count: usize,
    },
    /// Batch committed
    UploadComplete {
        /// Token to embed in the share link
        link_token: String,
        /// Number of files
        total: usize,
        /// Per-kind counts
        tally: KindTally,
    },
    /// Session finished without any file
    NoFilesUploaded,
    /// Done pressed without an open session
    NoActiveSession,
    /// Text sent while collecting media
    SendMediaReminder,
    /// Link statistics
    Stats(LinkStats),
    /// Command overview
    Help,
    /// Nothing to send
    Ignored,
}

/// Errors surfaced to the transport
#[derive(Error, Debug)]
pub enum RelayError {
    /// Link store failure
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Routes inbound events to the session controller and link resolver
pub struct FileRelay {
    sessions: SessionController,
    resolver: LinkResolver,
    admins: HashSet<i64>,
}

impl FileRelay {
    /// Create a relay over a link store with a static admin allow-list
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, admins: HashSet<i64>) -> Self {
        Self {
            sessions: SessionController::new(store.clone()),
            resolver: LinkResolver::new(store),
            admins,
        }
    }

    /// Whether `user_id` is on the admin allow-list
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Session controller
    #[must_use]
    pub const fn sessions(&self) -> &SessionController {
        &self.sessions
    }

    /// Handle one event from `user_id` in their private chat.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` when the link store fails.
    pub async fn handle(
        &self,
        transport: &dyn MediaTransport,
        user_id: i64,
        event: InboundEvent,
    ) -> Result<Reply, RelayError> {
        self.handle_in_chat(transport, user_id, user_id, event).await
    }

    /// Handle one event from `user_id` sent in `chat_id`.
    ///
    /// Files for a resolved link are sent to `chat_id` through `transport`
    /// before this returns, so they land next to the reply.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` when the link store fails.
    pub async fn handle_in_chat(
        &self,
        transport: &dyn MediaTransport,
        user_id: i64,
        chat_id: i64,
        event: InboundEvent,
    ) -> Result<Reply, RelayError> {
        let is_admin = self.is_admin(user_id);
        let reply = match event {
            InboundEvent::Start {
                payload: Some(link_token),
            } => self.open_link(transport, user_id, chat_id, &link_token).await?,
            InboundEvent::Start { payload: None } => {
                if is_admin {
                    Reply::AdminMenu
                } else {
                    Reply::UserMenu
                }
            }
            InboundEvent::UploadTrigger => {
                if is_admin {
                    self.sessions.start_upload(user_id).await;
                    Reply::UploadStarted
                } else {
                    info!(user_id, "Upload attempt from non-admin rejected.");
                    Reply::Unauthorized
                }
            }
            InboundEvent::Media(file) => {
                if !is_admin {
                    debug!(user_id, "Media from non-admin ignored.");
                    return Ok(Reply::Ignored);
                }
                match self.sessions.append_file(user_id, file).await {
                    Some(outcome) if outcome.report_progress => Reply::Progress {
                        count: outcome.count,
                    },
                    _ => Reply::Ignored,
                }
            }
            InboundEvent::FinishTrigger => {
                if is_admin {
                    self.finish(user_id).await?
                } else {
                    Reply::Unauthorized
                }
            }
            InboundEvent::Text(_) => {
                if self.sessions.has_session(user_id).await {
                    Reply::SendMediaReminder
                } else {
                    Reply::Ignored
                }
            }
            InboundEvent::Stats => {
                if is_admin {
                    Reply::Stats(self.resolver.stats().await?)
                } else {
                    Reply::Ignored
                }
            }
            InboundEvent::Help => Reply::Help,
        };
        Ok(reply)
    }

    async fn open_link(
        &self,
        transport: &dyn MediaTransport,
        user_id: i64,
        chat_id: i64,
        link_token: &str,
    ) -> Result<Reply, RelayError> {
        let files = match self.resolver.resolve(link_token).await {
            Ok(files) => files,
            Err(ResolveError::NotFound(_)) => {
                info!(user_id, link_token, "Unknown link requested.");
                return Ok(Reply::LinkNotFound);
            }
            Err(ResolveError::Storage(e)) => return Err(e.into()),
        };

        let report = self.resolver.deliver(transport, chat_id, files).await;
        info!(
            user_id,
            chat_id,
            link_token,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Link delivered."
        );
        Ok(Reply::Delivered { report })
    }

    async fn finish(&self, user_id: i64) -> Result<Reply, RelayError> {
        match self.sessions.finish_upload(user_id).await {
            Ok(outcome) if outcome.committed() => Ok(Reply::UploadComplete {
                link_token: outcome.link_token,
                total: outcome.total,
                tally: outcome.tally,
            }),
            Ok(_) => Ok(Reply::NoFilesUploaded),
            Err(SessionError::NoActiveSession) => Ok(Reply::NoActiveSession),
            Err(SessionError::Storage(e)) => Err(e.into()),
        }
    }
}
