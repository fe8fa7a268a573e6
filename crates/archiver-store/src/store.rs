//! # SQLite Archive Store
//!
//! Owns the connection pool and every statement that touches the archive
//! tables. Each write is one statement executed and committed on its own
//! pooled connection.
//!
//! ## Child-URL Deduplication
//!
//! `child_urls.url` is UNIQUE across the whole store. Inserts use
//! `ON CONFLICT(url) DO NOTHING`, and the affected-row count tells the two
//! outcomes apart: `1` is [`ChildUrlInsert::Inserted`], `0` is
//! [`ChildUrlInsert::AlreadyExists`]. Any other failure (including an
//! unknown `run_id`) is still an error, and no error text is ever inspected.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use archiver_core::{
    sha256_hex, ChildUrlId, ContentDigest, ExternalUuid, FileId, HeaderMap, RunId, Timestamp,
};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{
    ChildUrl, ChildUrlInsert, FileIntegrity, IntegrityReport, NewFile, NewRun, StoredFile,
    StoredRun,
};
use crate::schema;

/// Handle to the archive database.
///
/// Cloning is cheap; clones share one pool. Call [`close`](Self::close) to
/// drain the pool explicitly, otherwise connections close when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    pool: SqlitePool,
}

impl ArchiveStore {
    /// Open (creating if needed) the database described by `config` and
    /// apply the schema.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(StoreError::database("parse_database_url"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if config.is_in_memory() {
            1
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            // An in-memory database disappears with its last connection.
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StoreError::database("connect"))?;

        schema::init_schema(&pool).await?;
        info!(url = %config.database_url, max_connections, "archive store opened");

        Ok(Self { pool })
    }

    /// Open a private in-memory archive.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&StoreConfig::in_memory()).await
    }

    /// Close the pool, waiting for in-flight statements to finish.
    pub async fn close(self) {
        self.pool.close().await;
        debug!("archive store closed");
    }

    // -- Writes ---------------------------------------------------------------

    /// Insert a run row. The store assigns and returns the `run_id`.
    pub async fn insert_run(&self, run: &NewRun<'_>) -> Result<RunId, StoreError> {
        let result = sqlx::query(
            "INSERT INTO runs_metadata
             (url, external_uuid, timestamp, body_content, body_sha256, headers)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(run.url)
        .bind(run.external_uuid.to_string())
        .bind(run.fetched_at.to_iso8601())
        .bind(run.body)
        .bind(run.body_digest.to_hex())
        .bind(run.headers)
        .execute(&self.pool)
        .await
        .map_err(StoreError::database("insert_run"))?;

        let run_id = RunId(result.last_insert_rowid());
        debug!(%run_id, url = run.url, digest = %run.body_digest, "run inserted");
        Ok(run_id)
    }

    /// Record a child URL discovered during `run_id`.
    ///
    /// A URL already present anywhere in the store yields
    /// [`ChildUrlInsert::AlreadyExists`] and writes nothing.
    pub async fn insert_child_url(
        &self,
        run_id: RunId,
        url: &str,
        discovered_at: Timestamp,
    ) -> Result<ChildUrlInsert, StoreError> {
        let result = sqlx::query(
            "INSERT INTO child_urls (url, run_id, timestamp) VALUES (?, ?, ?)
             ON CONFLICT(url) DO NOTHING",
        )
        .bind(url)
        .bind(run_id.get())
        .bind(discovered_at.to_iso8601())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database("insert_child_url"))?;

        if result.rows_affected() == 1 {
            let id = ChildUrlId(result.last_insert_rowid());
            debug!(%run_id, url, %id, "child url recorded");
            return Ok(ChildUrlInsert::Inserted(id));
        }

        // A skipped row is never FK-checked, so the run is checked here.
        let run_exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM runs_metadata WHERE run_id = ?")
            .bind(run_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::database("lookup_run"))?
            .is_some();
        if !run_exists {
            return Err(StoreError::RunNotFound(run_id));
        }

        let (existing,) =
            sqlx::query_as::<_, (i64,)>("SELECT url_id FROM child_urls WHERE url = ?")
                .bind(url)
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::database("lookup_child_url"))?;

        debug!(%run_id, url, existing, "child url already recorded; skipping");
        Ok(ChildUrlInsert::AlreadyExists(ChildUrlId(existing)))
    }

    /// Insert a file row. The store assigns and returns the `file_id`.
    pub async fn insert_file(&self, file: &NewFile<'_>) -> Result<FileId, StoreError> {
        let result = sqlx::query(
            "INSERT INTO files
             (run_id, file_contents, filename, file_sha256, comments, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file.run_id.get())
        .bind(file.contents)
        .bind(file.filename)
        .bind(file.digest.to_hex())
        .bind(file.comments)
        .bind(file.stored_at.to_iso8601())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database("insert_file"))?;

        let file_id = FileId(result.last_insert_rowid());
        debug!(
            run_id = %file.run_id,
            %file_id,
            filename = file.filename,
            bytes = file.contents.len(),
            digest = %file.digest,
            "file inserted"
        );
        Ok(file_id)
    }

    /// Delete a run that owns no child URLs and no files.
    ///
    /// Runs with children are never removed ([`StoreError::RunHasChildren`]);
    /// the foreign keys are declared `ON DELETE RESTRICT` as a second guard.
    pub async fn delete_run(&self, run_id: RunId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::database("delete_run_begin"))?;

        let (child_urls, files) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT
                (SELECT COUNT(*) FROM child_urls WHERE run_id = ?),
                (SELECT COUNT(*) FROM files WHERE run_id = ?)",
        )
        .bind(run_id.get())
        .bind(run_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::database("delete_run_count_children"))?;

        if child_urls > 0 || files > 0 {
            return Err(StoreError::RunHasChildren {
                run_id,
                child_urls,
                files,
            });
        }

        let result = sqlx::query("DELETE FROM runs_metadata WHERE run_id = ?")
            .bind(run_id.get())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database("delete_run"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }

        tx.commit()
            .await
            .map_err(StoreError::database("delete_run_commit"))?;
        info!(%run_id, "run deleted");
        Ok(())
    }

    // -- Reads ----------------------------------------------------------------

    /// Fetch a run by id.
    pub async fn get_run(&self, run_id: RunId) -> Result<Option<StoredRun>, StoreError> {
        let row = sqlx::query_as::<_, RunRow>(
            "SELECT run_id, url, external_uuid, timestamp, body_content, body_sha256, headers
             FROM runs_metadata WHERE run_id = ?",
        )
        .bind(run_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database("get_run"))?;

        row.map(RunRow::into_stored).transpose()
    }

    /// All child URLs first discovered by `run_id`, in insertion order.
    pub async fn child_urls(&self, run_id: RunId) -> Result<Vec<ChildUrl>, StoreError> {
        let rows = sqlx::query_as::<_, ChildUrlRow>(
            "SELECT url_id, url, run_id, timestamp FROM child_urls
             WHERE run_id = ? ORDER BY url_id",
        )
        .bind(run_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database("child_urls"))?;

        rows.into_iter().map(ChildUrlRow::into_child_url).collect()
    }

    /// Total rows in `child_urls` across all runs.
    pub async fn child_url_count(&self) -> Result<i64, StoreError> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM child_urls")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::database("child_url_count"))?;
        Ok(count)
    }

    /// All files recorded against `run_id`, in insertion order.
    pub async fn files(&self, run_id: RunId) -> Result<Vec<StoredFile>, StoreError> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT file_id, run_id, file_contents, filename, file_sha256, comments, timestamp
             FROM files WHERE run_id = ? ORDER BY file_id",
        )
        .bind(run_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database("files"))?;

        rows.into_iter().map(FileRow::into_stored).collect()
    }

    /// Re-hash the stored body and every stored file of `run_id`.
    ///
    /// Mismatches are reported, not raised; a malformed stored digest simply
    /// never matches.
    pub async fn verify_run(&self, run_id: RunId) -> Result<IntegrityReport, StoreError> {
        let (body, stored_body_digest) = sqlx::query_as::<_, (Vec<u8>, String)>(
            "SELECT body_content, body_sha256 FROM runs_metadata WHERE run_id = ?",
        )
        .bind(run_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database("verify_run"))?
        .ok_or(StoreError::RunNotFound(run_id))?;

        let file_rows = sqlx::query_as::<_, (i64, String, Vec<u8>, String)>(
            "SELECT file_id, filename, file_contents, file_sha256 FROM files
             WHERE run_id = ? ORDER BY file_id",
        )
        .bind(run_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database("verify_run_files"))?;

        let report = IntegrityReport {
            run_id,
            computed_body_digest: sha256_hex(&body),
            stored_body_digest,
            files: file_rows
                .into_iter()
                .map(|(file_id, filename, contents, stored_digest)| FileIntegrity {
                    file_id: FileId(file_id),
                    filename,
                    stored_digest,
                    computed_digest: sha256_hex(&contents),
                })
                .collect(),
        };

        if report.is_intact() {
            debug!(%run_id, files = report.files.len(), "run integrity verified");
        } else {
            tracing::warn!(
                %run_id,
                body_intact = report.body_intact(),
                damaged_files = report.damaged_files().count(),
                "run integrity check failed"
            );
        }
        Ok(report)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// -- Row mapping ----------------------------------------------------------------

fn corrupt(table: &'static str) -> impl Fn(archiver_core::ArchiverError) -> StoreError {
    move |e| StoreError::Corrupt {
        table,
        reason: e.to_string(),
    }
}

#[derive(sqlx::FromRow)]
struct RunRow {
    run_id: i64,
    url: String,
    external_uuid: String,
    timestamp: String,
    body_content: Vec<u8>,
    body_sha256: String,
    headers: String,
}

impl RunRow {
    fn into_stored(self) -> Result<StoredRun, StoreError> {
        let table = "runs_metadata";
        Ok(StoredRun {
            run_id: RunId(self.run_id),
            url: self.url,
            external_uuid: ExternalUuid::from(self.external_uuid),
            fetched_at: Timestamp::parse(&self.timestamp).map_err(corrupt(table))?,
            body: self.body_content,
            body_digest: ContentDigest::from_hex(&self.body_sha256).map_err(corrupt(table))?,
            headers: HeaderMap::from_stable_text(&self.headers).map_err(corrupt(table))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChildUrlRow {
    url_id: i64,
    url: String,
    run_id: i64,
    timestamp: String,
}

impl ChildUrlRow {
    fn into_child_url(self) -> Result<ChildUrl, StoreError> {
        Ok(ChildUrl {
            url_id: ChildUrlId(self.url_id),
            url: self.url,
            run_id: RunId(self.run_id),
            discovered_at: Timestamp::parse(&self.timestamp).map_err(corrupt("child_urls"))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    file_id: i64,
    run_id: i64,
    file_contents: Vec<u8>,
    filename: String,
    file_sha256: String,
    comments: Option<String>,
    timestamp: String,
}

impl FileRow {
    fn into_stored(self) -> Result<StoredFile, StoreError> {
        Ok(StoredFile {
            file_id: FileId(self.file_id),
            run_id: RunId(self.run_id),
            contents: self.file_contents,
            filename: self.filename,
            digest: ContentDigest::from_hex(&self.file_sha256).map_err(corrupt("files"))?,
            comments: self.comments,
            stored_at: Timestamp::parse(&self.timestamp).map_err(corrupt("files"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archiver_core::sha256_digest;

    async fn store_with_run(body: &[u8]) -> (ArchiveStore, RunId) {
        let store = ArchiveStore::open_in_memory().await.unwrap();
        let uuid = ExternalUuid::new();
        let digest = sha256_digest(body);
        let run_id = store
            .insert_run(&NewRun {
                url: "https://example.org/a",
                external_uuid: &uuid,
                fetched_at: Timestamp::now(),
                body,
                body_digest: &digest,
                headers: "{}",
            })
            .await
            .unwrap();
        (store, run_id)
    }

    #[tokio::test]
    async fn run_ids_are_assigned_sequentially() {
        let (store, first) = store_with_run(b"one").await;
        let uuid = ExternalUuid::new();
        let digest = sha256_digest(b"two");
        let second = store
            .insert_run(&NewRun {
                url: "https://example.org/b",
                external_uuid: &uuid,
                fetched_at: Timestamp::now(),
                body: b"two",
                body_digest: &digest,
                headers: "{}",
            })
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn get_run_returns_none_for_unknown_id() {
        let store = ArchiveStore::open_in_memory().await.unwrap();
        assert!(store.get_run(RunId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_child_url_reports_existing_row() {
        let (store, run_id) = store_with_run(b"body").await;
        let first = store
            .insert_child_url(run_id, "https://example.org/b", Timestamp::now())
            .await
            .unwrap();
        let second = store
            .insert_child_url(run_id, "https://example.org/b", Timestamp::now())
            .await
            .unwrap();
        assert!(first.is_inserted());
        assert_eq!(second, ChildUrlInsert::AlreadyExists(first.id()));
        assert_eq!(store.child_url_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn child_url_for_unknown_run_is_an_error() {
        let store = ArchiveStore::open_in_memory().await.unwrap();
        let err = store
            .insert_child_url(RunId(999), "https://example.org/x", Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Database {
                operation: "insert_child_url",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn known_child_url_for_unknown_run_is_an_error() {
        let (store, run_id) = store_with_run(b"hello").await;
        store
            .insert_child_url(run_id, "https://example.org/known", Timestamp::now())
            .await
            .unwrap();

        let err = store
            .insert_child_url(RunId(999), "https://example.org/known", Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RunNotFound(RunId(999))));
        assert_eq!(store.child_url_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn file_for_unknown_run_is_an_error() {
        let store = ArchiveStore::open_in_memory().await.unwrap();
        let digest = sha256_digest(b"data");
        let err = store
            .insert_file(&NewFile {
                run_id: RunId(999),
                contents: b"data",
                filename: "data.bin",
                digest: &digest,
                comments: None,
                stored_at: Timestamp::now(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database { operation: "insert_file", .. }));
    }

    #[tokio::test]
    async fn verify_reports_tampered_body() {
        let (store, run_id) = store_with_run(b"original").await;
        assert!(store.verify_run(run_id).await.unwrap().is_intact());

        sqlx::query("UPDATE runs_metadata SET body_content = ? WHERE run_id = ?")
            .bind(b"tampered".as_slice())
            .bind(run_id.get())
            .execute(store.pool())
            .await
            .unwrap();

        let report = store.verify_run(run_id).await.unwrap();
        assert!(!report.body_intact());
        assert!(!report.is_intact());
    }

    #[tokio::test]
    async fn verify_unknown_run_is_not_found() {
        let store = ArchiveStore::open_in_memory().await.unwrap();
        assert!(matches!(
            store.verify_run(RunId(5)).await,
            Err(StoreError::RunNotFound(RunId(5)))
        ));
    }

    #[tokio::test]
    async fn malformed_stored_digest_is_corrupt_on_read() {
        let (store, run_id) = store_with_run(b"body").await;
        sqlx::query("UPDATE runs_metadata SET body_sha256 = 'nope' WHERE run_id = ?")
            .bind(run_id.get())
            .execute(store.pool())
            .await
            .unwrap();

        assert!(matches!(
            store.get_run(run_id).await,
            Err(StoreError::Corrupt { table: "runs_metadata", .. })
        ));
        assert!(!store.verify_run(run_id).await.unwrap().is_intact());
    }

    #[tokio::test]
    async fn sign_prefixed_stored_digest_is_corrupt_on_read() {
        let (store, run_id) = store_with_run(b"body").await;
        sqlx::query("UPDATE runs_metadata SET body_sha256 = ? WHERE run_id = ?")
            .bind("+0".repeat(32))
            .bind(run_id.get())
            .execute(store.pool())
            .await
            .unwrap();

        assert!(matches!(
            store.get_run(run_id).await,
            Err(StoreError::Corrupt { table: "runs_metadata", .. })
        ));
    }
}
