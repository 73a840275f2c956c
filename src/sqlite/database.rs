use std::fmt;
use std::time::Duration;

use crate::error::SqlMiddlewareDbError;

use super::config::SqliteOptions;
use super::connection::Connection;

/// An open `SQLite` database handle.
///
/// Sessions borrow it through [`Database::connect`]; the borrow keeps every compiled
/// statement of the session from outliving the handle.
pub struct Database {
    raw: rusqlite::Connection,
    opts: SqliteOptions,
}

impl Database {
    /// Open the database described by `opts`.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConnectionError` if the file cannot be opened, or
    /// `SqlMiddlewareDbError::ConfigError` if a configured pragma cannot be applied.
    pub fn open(opts: SqliteOptions) -> Result<Self, SqlMiddlewareDbError> {
        let raw = rusqlite::Connection::open(&opts.db_path).map_err(|e| {
            SqlMiddlewareDbError::ConnectionError(format!(
                "failed to open SQLite database {:?}: {e}",
                opts.db_path
            ))
        })?;

        if let Some(millis) = opts.busy_timeout_ms {
            raw.busy_timeout(Duration::from_millis(millis))
                .map_err(|e| {
                    SqlMiddlewareDbError::ConfigError(format!("failed to set busy timeout: {e}"))
                })?;
        }
        if opts.wal && !opts.is_in_memory() {
            apply_wal_pragmas(&raw)?;
        }

        tracing::debug!(
            path = %opts.db_path,
            cache_capacity = opts.statement_cache_capacity,
            "opened SQLite database"
        );
        Ok(Self { raw, opts })
    }

    /// Open an in-memory database with default options.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, SqlMiddlewareDbError> {
        Self::open(SqliteOptions::default())
    }

    /// Start the session for this handle, using the configured statement cache capacity.
    pub fn connect(&mut self) -> Connection<'_> {
        let capacity = self.opts.statement_cache_capacity;
        Connection::new(&self.raw, capacity)
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    /// Close the handle, surfacing any error `SQLite` reports while closing.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConnectionError` if `SQLite` refuses to close.
    pub fn close(self) -> Result<(), SqlMiddlewareDbError> {
        let path = self.opts.db_path;
        self.raw.close().map_err(|(_, err)| {
            SqlMiddlewareDbError::ConnectionError(format!(
                "failed to close SQLite database {path:?}: {err}"
            ))
        })?;
        tracing::debug!(path = %path, "closed SQLite database");
        Ok(())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("db_path", &self.opts.db_path)
            .field("statement_cache_capacity", &self.opts.statement_cache_capacity)
            .finish()
    }
}

/// Switch the database to WAL journaling.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ConfigError` if the PRAGMA cannot be executed.
pub fn apply_wal_pragmas(raw: &rusqlite::Connection) -> Result<(), SqlMiddlewareDbError> {
    let mode: String = raw
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|e| SqlMiddlewareDbError::ConfigError(format!("failed to enable WAL: {e}")))?;
    if !mode.eq_ignore_ascii_case("wal") {
        tracing::warn!(mode = %mode, "SQLite kept a non-WAL journal mode");
    }
    Ok(())
}
