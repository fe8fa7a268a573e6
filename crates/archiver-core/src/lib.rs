//! # archiver-core — Foundational Types for the Crawl Archiver
//!
//! Defines the type-system primitives shared by the store, the HTTP client
//! and the CLI. Every other crate in the workspace depends on
//! `archiver-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Byte-exact content identity.** A [`ContentDigest`] is computed over
//!    explicit byte sequences only. [`ContentHasher`] produces the same digest
//!    for the same bytes whether they arrive whole or in bounded chunks.
//!
//! 2. **Newtype wrappers for identifiers.** `RunId`, `FileId`, `ChildUrlId`
//!    and `ExternalUuid` are distinct types. A file id cannot be passed where
//!    a run id is expected.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC with a `Z` suffix and
//!    seconds precision, so stored rows compare and sort as text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `archiver-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod fetch;
pub mod hasher;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::ArchiverError;
pub use fetch::{FetchResult, HeaderMap};
pub use hasher::{ContentHasher, IncrementalDigest, DEFAULT_CHUNK_SIZE};
pub use identity::{ChildUrlId, ExternalUuid, FileId, RunId};
pub use temporal::Timestamp;
