use crate::error::SqlMiddlewareDbError;
use crate::sqlite::params::BoundParams;
use crate::sqlite::query::reports_changes;
use crate::types::RowValues;

use super::Connection;

impl Connection<'_> {
    /// Execute an INSERT/UPDATE/DELETE through the statement cache and return the number of
    /// rows it changed.
    ///
    /// Other statements (DDL, `PRAGMA`, transaction control) report `0`.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError` if compiling, binding or executing the statement fails.
    pub fn execute_write(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlMiddlewareDbError> {
        let result = self.write_cached(sql, &BoundParams::bind(params));
        self.record(result)
    }

    pub(crate) fn write_cached(
        &mut self,
        sql: &str,
        bound: &BoundParams,
    ) -> Result<usize, SqlMiddlewareDbError> {
        let was_autocommit = self.raw.is_autocommit();
        let affected = {
            let mut stmt = self.cache.acquire(self.raw, sql)?;
            bound.apply(&mut stmt)?;
            self.executed += 1;
            stmt.raw_execute().map_err(SqlMiddlewareDbError::execution)?
        };
        self.track_transaction_boundary(was_autocommit, sql);
        let affected = if reports_changes(sql) { affected } else { 0 };
        self.note_write(affected);
        Ok(affected)
    }
}
