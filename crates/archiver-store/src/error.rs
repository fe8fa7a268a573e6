//! Archive store error types.

use std::path::PathBuf;

use archiver_core::{ArchiverError, RunId};

/// Errors from the persistence boundary.
///
/// A duplicate child URL is not an error; it is reported as
/// [`ChildUrlInsert::AlreadyExists`](crate::ChildUrlInsert::AlreadyExists).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected or failed a statement.
    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        source: sqlx::Error,
    },
    /// No run with this id exists.
    #[error("{0} not found")]
    RunNotFound(RunId),
    /// The run still owns rows and the RESTRICT policy forbids deleting it.
    #[error("{run_id} still has {child_urls} child URL(s) and {files} file(s); refusing to delete")]
    RunHasChildren {
        run_id: RunId,
        child_urls: i64,
        files: i64,
    },
    /// A stored row could not be decoded into its typed form.
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
    /// Core value error (e.g., header serialization).
    #[error(transparent)]
    Core(#[from] ArchiverError),
}

impl StoreError {
    pub(crate) fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { operation, source }
    }
}

/// Errors from [`RunRecord`](crate::RunRecord) operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A local file could not be opened or read to completion.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file's bytes changed between the hashing pass and the storage pass.
    #[error("{} changed while it was being archived", .path.display())]
    FileChanged { path: PathBuf },
    /// The blocking file-ingestion task panicked or was cancelled.
    #[error("file ingestion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Core value error.
    #[error(transparent)]
    Core(#[from] ArchiverError),
}
