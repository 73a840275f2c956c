use serde::Deserialize;

use crate::error::SqlMiddlewareDbError;

use super::database::Database;

/// Statement cache size used when none is configured.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 32;

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Number of compiled statements each connection keeps; `0` disables caching.
    pub statement_cache_capacity: usize,
    pub busy_timeout_ms: Option<u64>,
    /// Switch file-backed databases to WAL journaling after open.
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            busy_timeout_ms: None,
            wal: false,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    pub(crate) fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:" || self.db_path.contains("mode=memory")
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, millis: u64) -> Self {
        self.opts.busy_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a [`Database`] with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError` if the database cannot be opened or configured.
    pub fn open(self) -> Result<Database, SqlMiddlewareDbError> {
        Database::open(self.finish())
    }
}
