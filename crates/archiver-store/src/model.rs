//! Row types for the three archive tables.
//!
//! `New*` types borrow their payload for a single insert; `Stored*` types
//! own what was read back.

use serde::Serialize;

use archiver_core::{ChildUrlId, ContentDigest, ExternalUuid, FileId, HeaderMap, RunId, Timestamp};

/// A run row about to be inserted into `runs_metadata`.
#[derive(Debug, Clone)]
pub struct NewRun<'a> {
    pub url: &'a str,
    pub external_uuid: &'a ExternalUuid,
    pub fetched_at: Timestamp,
    pub body: &'a [u8],
    pub body_digest: &'a ContentDigest,
    /// Headers in their stable textual form.
    pub headers: &'a str,
}

/// A run row read back from `runs_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRun {
    pub run_id: RunId,
    pub url: String,
    pub external_uuid: ExternalUuid,
    pub fetched_at: Timestamp,
    #[serde(skip)]
    pub body: Vec<u8>,
    pub body_digest: ContentDigest,
    pub headers: HeaderMap,
}

/// Outcome of recording a child URL.
///
/// Both variants are successes: the child-URL table is a global dedup set,
/// so rediscovering a known link is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildUrlInsert {
    /// A new row was written.
    Inserted(ChildUrlId),
    /// The URL was already recorded (by this run or another); nothing was written.
    AlreadyExists(ChildUrlId),
}

impl ChildUrlInsert {
    /// The id of the row holding the URL, whether new or pre-existing.
    pub fn id(&self) -> ChildUrlId {
        match self {
            Self::Inserted(id) | Self::AlreadyExists(id) => *id,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// A row of `child_urls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildUrl {
    pub url_id: ChildUrlId,
    pub url: String,
    pub run_id: RunId,
    pub discovered_at: Timestamp,
}

/// A file row about to be inserted into `files`.
#[derive(Debug, Clone)]
pub struct NewFile<'a> {
    pub run_id: RunId,
    pub contents: &'a [u8],
    pub filename: &'a str,
    pub digest: &'a ContentDigest,
    pub comments: Option<&'a str>,
    pub stored_at: Timestamp,
}

/// A row of `files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub file_id: FileId,
    pub run_id: RunId,
    #[serde(skip)]
    pub contents: Vec<u8>,
    pub filename: String,
    pub digest: ContentDigest,
    pub comments: Option<String>,
    pub stored_at: Timestamp,
}

/// Result of re-hashing one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIntegrity {
    pub file_id: FileId,
    pub filename: String,
    pub stored_digest: String,
    pub computed_digest: String,
}

impl FileIntegrity {
    pub fn is_intact(&self) -> bool {
        self.stored_digest.eq_ignore_ascii_case(&self.computed_digest)
    }
}

/// Result of re-hashing a run body and all of its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub run_id: RunId,
    pub stored_body_digest: String,
    pub computed_body_digest: String,
    pub files: Vec<FileIntegrity>,
}

impl IntegrityReport {
    pub fn body_intact(&self) -> bool {
        self.stored_body_digest
            .eq_ignore_ascii_case(&self.computed_body_digest)
    }

    /// Whether the body and every file still hash to their stored digests.
    pub fn is_intact(&self) -> bool {
        self.body_intact() && self.files.iter().all(FileIntegrity::is_intact)
    }

    /// Files whose contents no longer match their stored digest.
    pub fn damaged_files(&self) -> impl Iterator<Item = &FileIntegrity> {
        self.files.iter().filter(|f| !f.is_intact())
    }
}
