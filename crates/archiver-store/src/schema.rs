//! Table definitions, applied on every open.

use sqlx::SqlitePool;

use crate::error::StoreError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS runs_metadata (
        run_id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        external_uuid TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        body_content BLOB NOT NULL,
        body_sha256 TEXT NOT NULL,
        headers TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS files (
        file_id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id INTEGER NOT NULL REFERENCES runs_metadata(run_id) ON DELETE RESTRICT,
        file_contents BLOB NOT NULL,
        filename TEXT NOT NULL,
        file_sha256 TEXT NOT NULL,
        comments TEXT,
        timestamp TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS child_urls (
        url_id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        run_id INTEGER NOT NULL REFERENCES runs_metadata(run_id) ON DELETE RESTRICT,
        timestamp TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_files_run_id ON files(run_id)",
    "CREATE INDEX IF NOT EXISTS idx_child_urls_run_id ON child_urls(run_id)",
];

/// Create the archive tables and indexes if they do not exist.
pub(crate) async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(StoreError::database("init_schema"))?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "archive schema applied");
    Ok(())
}
