//! # Identifier Newtypes
//!
//! Store-assigned row identifiers and the caller-supplied run identifier.
//! Each is a distinct type so a file id can never be bound where a run id
//! belongs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of a `runs_metadata` row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub i64);

/// Primary key of a `files` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub i64);

/// Primary key of a `child_urls` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChildUrlId(pub i64);

/// Identifier the scraper host assigns to a collection run.
///
/// Opaque caller metadata: stored and returned verbatim. Usually a UUID, but
/// any text is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalUuid(String);

impl RunId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl FileId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl ChildUrlId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl ExternalUuid {
    /// Generate a new random (v4 UUID) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a UUID, if it is one.
    pub fn as_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl From<String> for ExternalUuid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExternalUuid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ExternalUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file:{}", self.0)
    }
}

impl std::fmt::Display for ChildUrlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "child-url:{}", self.0)
    }
}

impl std::fmt::Display for ExternalUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
