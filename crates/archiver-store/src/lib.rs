//! # archiver-store — Durable Archive of Crawl Runs
//!
//! Persists each fetched resource ("run"), the child links discovered while
//! processing it, and the local files it produced. Three append-only SQLite
//! tables back the archive:
//!
//! | Table | Key | Notes |
//! |-------|-----|-------|
//! | `runs_metadata` | `run_id` | body bytes, body SHA-256, serialized headers |
//! | `child_urls` | `url_id` | `url` is globally UNIQUE; duplicates are a no-op |
//! | `files` | `file_id` | file bytes and their SHA-256 |
//!
//! ## Architecture
//!
//! [`ArchiveStore`] is an explicitly constructed handle around a connection
//! pool; there is no process-wide engine. [`RunRecord`] is the aggregate for
//! one run: it computes the body digest, inserts the run row exactly once,
//! and records children against the store-assigned [`RunId`].
//!
//! Every write is a single-row statement committed on its own, so no lock is
//! held while the caller performs network I/O between writes.
//!
//! ## Retention
//!
//! Runs are never deleted implicitly. [`ArchiveStore::delete_run`] refuses to
//! remove a run that still has child URLs or files (RESTRICT).
//!
//! [`RunId`]: archiver_core::RunId

pub mod config;
pub mod error;
pub mod model;
pub mod record;
pub(crate) mod schema;
pub mod store;

pub use config::StoreConfig;
pub use error::{RecordError, StoreError};
pub use model::{
    ChildUrl, ChildUrlInsert, FileIntegrity, IntegrityReport, NewFile, NewRun, StoredFile,
    StoredRun,
};
pub use record::RunRecord;
pub use store::ArchiveStore;
