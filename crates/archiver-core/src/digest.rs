//! # Content Digest — Content-Addressed Identifiers
//!
//! Defines `ContentDigest` and `DigestAlgorithm`. Every run body and every
//! archived file is identified by the SHA-256 digest of its exact bytes.
//!
//! ## Storage Format
//!
//! Digests are persisted as 64 lowercase hex characters ([`ContentDigest::to_hex`])
//! and parsed back with [`ContentDigest::from_hex`], which rejects anything
//! that is not exactly 32 bytes of hex.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ArchiverError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256, the only algorithm the archive tables carry.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content-addressed digest with its algorithm tag.
///
/// Serializes as its 64-character hex form, the same text the archive
/// tables hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new content digest from raw bytes and algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a SHA-256 digest from its 64-character hex form.
    ///
    /// Upper-case hex is accepted; [`to_hex`](Self::to_hex) always renders
    /// lower-case.
    pub fn from_hex(hex: &str) -> Result<Self, ArchiverError> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ArchiverError::InvalidDigest(format!(
                "expected 64 hex characters, got {hex:?}"
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| {
                ArchiverError::InvalidDigest(format!("non-hex characters in {hex:?}"))
            })?;
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }

    /// Whether `data` hashes to this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        sha256_digest(data) == *self
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = ArchiverError;

    /// Accepts either bare hex or the `sha256:`-prefixed display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.strip_prefix("sha256:").unwrap_or(s))
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_hex()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ArchiverError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Compute a SHA-256 content digest over a fully materialized byte slice.
pub fn sha256_digest(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

/// Compute a SHA-256 hex string over a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    sha256_digest(data).to_hex()
}
