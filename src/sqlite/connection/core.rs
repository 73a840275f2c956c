use std::fmt;

use crate::error::SqlMiddlewareDbError;
use crate::sqlite::cache::{CacheStats, StatementCache};

use super::tx::TransactionState;

/// Last-error code for failures raised before the engine saw the statement (binding,
/// validation).
pub const CLIENT_ERROR_CODE: i32 = -1;

/// Error recorded for the most recent failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub code: i32,
    pub message: String,
}

/// A single-owner session on a [`Database`](crate::sqlite::Database).
///
/// Owns the statement cache, the last-error state, the executed-statement counter and the
/// transaction state. Not meant to be shared; parallel work needs one `Database` per
/// worker.
pub struct Connection<'db> {
    pub(crate) raw: &'db rusqlite::Connection,
    pub(crate) cache: StatementCache<'db>,
    pub(crate) last_error: Option<LastError>,
    pub(crate) executed: u64,
    pub(crate) affected_rows: usize,
    pub(crate) last_insert_id: i64,
    pub(crate) tx_state: TransactionState,
}

impl<'db> Connection<'db> {
    pub(crate) fn new(raw: &'db rusqlite::Connection, cache_capacity: usize) -> Self {
        Self {
            raw,
            cache: StatementCache::new(cache_capacity),
            last_error: None,
            executed: 0,
            affected_rows: 0,
            last_insert_id: 0,
            tx_state: TransactionState::None,
        }
    }

    /// Update the last-error state from the outcome of a public operation.
    pub(crate) fn record<T>(
        &mut self,
        result: Result<T, SqlMiddlewareDbError>,
    ) -> Result<T, SqlMiddlewareDbError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                self.last_error = Some(match err.server_error() {
                    Some((code, message)) => LastError {
                        code,
                        message: message.to_owned(),
                    },
                    None => LastError {
                        code: CLIENT_ERROR_CODE,
                        message: err.to_string(),
                    },
                });
            }
        }
        result
    }

    pub(crate) fn note_write(&mut self, affected: usize) {
        self.affected_rows = affected;
        self.last_insert_id = self.raw.last_insert_rowid();
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Engine error code of the last failure, [`CLIENT_ERROR_CODE`] for failures raised
    /// before reaching the engine, `0` when the last operation succeeded.
    #[must_use]
    pub fn last_error_code(&self) -> i32 {
        self.last_error.as_ref().map_or(0, |e| e.code)
    }

    #[must_use]
    pub fn last_error_message(&self) -> &str {
        self.last_error.as_ref().map_or("", |e| e.message.as_str())
    }

    /// Rows changed by the most recent write.
    #[must_use]
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    /// Rowid generated by the most recent successful insert.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Statements dispatched to the engine since the counter was last reset.
    #[must_use]
    pub fn executed_statements(&self) -> u64 {
        self.executed
    }

    pub fn reset_executed_statements(&mut self) {
        self.executed = 0;
    }

    #[must_use]
    pub fn statement_cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Resize this session's statement cache; `0` disables caching and releases everything.
    pub fn set_statement_cache_capacity(&mut self, capacity: usize) {
        self.cache.resize(capacity);
    }

    pub fn clear_statement_cache(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn statement_cache_len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_statement_cached(&self, sql: &str) -> bool {
        self.cache.contains(sql)
    }

    #[must_use]
    pub fn statement_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Direct access to the driver connection for work this layer does not cover.
    #[must_use]
    pub fn raw(&self) -> &'db rusqlite::Connection {
        self.raw
    }

    /// End the session, finalizing every cached statement.
    pub fn close(mut self) {
        self.cache.clear();
        tracing::debug!(executed = self.executed, "closed connection");
    }
}

impl fmt::Debug for Connection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("cached_statements", &self.cache.len())
            .field("cache_capacity", &self.cache.capacity())
            .field("executed", &self.executed)
            .field("tx_state", &self.tx_state)
            .field("last_error", &self.last_error)
            .finish()
    }
}
