//! Domain types shared by every component.
//!
//! A [`FileRef`] only points at media hosted by the messaging platform;
//! no file content ever passes through this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a shared media item. Selects the send primitive used on replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Compressed photo
    Photo,
    /// Video clip
    Video,
    /// Arbitrary document
    Document,
    /// Music / audio track
    Audio,
    /// Voice note
    Voice,
    /// GIF or silent video animation
    Animation,
    /// Sticker
    Sticker,
}

impl FileKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Photo,
        Self::Video,
        Self::Document,
        Self::Audio,
        Self::Voice,
        Self::Animation,
        Self::Sticker,
    ];

    /// Lowercase wire name, as stored in link documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Voice => "voice",
            Self::Animation => "animation",
            Self::Sticker => "sticker",
        }
    }

    /// Only photos and videos keep their caption.
    #[must_use]
    pub const fn keeps_caption(self) -> bool {
        matches!(self, Self::Photo | Self::Video)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one platform-hosted media item.
///
/// `kind` is fixed at construction; there is no way to change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(rename = "type")]
    kind: FileKind,
    #[serde(rename = "file_id")]
    handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
}

impl FileRef {
    /// Create a file reference. Captions are dropped for kinds that do not keep them.
    #[must_use]
    pub fn new(kind: FileKind, handle: impl Into<String>, caption: Option<String>) -> Self {
        let caption = if kind.keeps_caption() {
            caption.filter(|c| !c.is_empty())
        } else {
            None
        };
        Self {
            kind,
            handle: handle.into(),
            caption,
        }
    }

    /// Media kind
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        self.kind
    }

    /// Opaque platform file handle
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Caption, if any. Empty captions in older documents read as `None`.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.is_empty())
    }
}

/// An admin's in-progress batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    owner_id: i64,
    link_token: String,
    files: Vec<FileRef>,
}

impl UploadSession {
    /// Open an empty session with a pre-generated link token.
    #[must_use]
    pub fn new(owner_id: i64, link_token: impl Into<String>) -> Self {
        Self {
            owner_id,
            link_token: link_token.into(),
            files: Vec::new(),
        }
    }

    /// Admin who opened the session
    #[must_use]
    pub const fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Token the batch will be committed under
    #[must_use]
    pub fn link_token(&self) -> &str {
        &self.link_token
    }

    /// Files collected so far, in arrival order
    #[must_use]
    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    /// Append a file and return the new count.
    pub fn push(&mut self, file: FileRef) -> usize {
        self.files.push(file);
        self.files.len()
    }

    /// Number of collected files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file has been collected yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A committed, resolvable batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Key embedded in the share link
    pub link_token: String,
    /// Files in replay order
    pub files: Vec<FileRef>,
    /// Admin who committed the batch
    pub created_by: i64,
    /// Commit time
    pub created_at: DateTime<Utc>,
    /// Number of files at commit time
    pub total_files: u64,
    /// How many times the link has been resolved
    #[serde(default)]
    pub access_count: u64,
}

impl LinkRecord {
    /// Build a fresh record from a finished session.
    #[must_use]
    pub fn from_session(session: UploadSession, created_at: DateTime<Utc>) -> Self {
        let total_files = session.files.len() as u64;
        Self {
            link_token: session.link_token,
            files: session.files,
            created_by: session.owner_id,
            created_at,
            total_files,
            access_count: 0,
        }
    }
}

/// Per-kind file counts, in [`FileKind`] declaration order.
pub type KindTally = BTreeMap<FileKind, usize>;

/// Count files by kind.
#[must_use]
pub fn tally_kinds(files: &[FileRef]) -> KindTally {
    let mut tally = KindTally::new();
    for file in files {
        *tally.entry(file.kind()).or_insert(0) += 1;
    }
    tally
}

/// Aggregate link statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Number of committed links
    pub total_links: u64,
    /// Sum of all access counters
    pub total_accesses: u64,
}

/// Link token for a new session: `file_<unix seconds>_<owner id>`.
#[must_use]
pub fn generate_link_token(owner_id: i64, now: DateTime<Utc>) -> String {
    format!("file_{}_{owner_id}", now.timestamp())
}

/// Shareable deep link that replays a batch when opened.
#[must_use]
pub fn share_link(bot_username: &str, link_token: &str) -> String {
    format!("https://t.me/{bot_username}?start={link_token}")
}

/// Progress is reported on the first file and on every even count.
#[must_use]
pub const fn should_report_progress(count: usize) -> bool {
    count == 1 || count % 2 == 0
}
