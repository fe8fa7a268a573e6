//! Archive store configuration.
//!
//! Defaults write to `data.sqlite` in the working directory. Override via
//! environment variables or explicit construction.

/// Default database URL: a SQLite file in the working directory, created on
/// first open.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data.sqlite?mode=rwc";

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Configuration for opening an [`ArchiveStore`](crate::ArchiveStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 4,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ARCHIVER_DATABASE_URL` (default: `sqlite://data.sqlite?mode=rwc`)
    /// - `ARCHIVER_DB_MAX_CONNECTIONS` (default: 4)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: std::env::var("ARCHIVER_DATABASE_URL")
                .unwrap_or(defaults.database_url),
            max_connections: std::env::var("ARCHIVER_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
        }
    }

    /// A private in-memory database. Lives as long as the store handle.
    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
        }
    }

    /// A SQLite file at `path`, created if missing.
    pub fn file(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            database_url: format!("sqlite://{}?mode=rwc", path.as_ref().display()),
            ..Self::default()
        }
    }

    /// Whether the URL names an in-memory database.
    ///
    /// Each SQLite connection to `:memory:` gets its own database, so such
    /// stores must run on exactly one connection.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}
