use std::sync::Arc;

use rusqlite::{Rows, Statement};

use crate::error::SqlMiddlewareDbError;
use crate::results::{ColumnIndex, CustomDbRow, ResultSet, column_index};
use crate::sqlite::params::BoundParams;
use crate::sqlite::query::{build_result_set, column_names, extract_row};
use crate::types::RowValues;

use super::Connection;

impl<'db> Connection<'db> {
    /// Execute a row-returning statement through the statement cache and materialize the
    /// rows.
    ///
    /// The result is fully consumed before returning, so the cached statement is free for
    /// the next execution of the same SQL text.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError` if compiling, binding or stepping the statement fails.
    pub fn execute_read(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        let result = self.read_cached(sql, params);
        self.record(result)
    }

    fn read_cached(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        let bound = BoundParams::bind(params);
        let mut stmt = self.cache.acquire(self.raw, sql)?;
        bound.apply(&mut stmt)?;
        self.executed += 1;
        build_result_set(&mut stmt)
    }

    /// Execute a row-returning statement on a freshly compiled, never-cached statement and
    /// return a lazy stream over its rows.
    ///
    /// The statement is owned by the returned [`RowStream`] and finalized when the stream is
    /// dropped, whether or not the rows were exhausted.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError` if compiling or binding the statement fails.
    pub fn execute_streaming(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<RowStream<'db>, SqlMiddlewareDbError> {
        let result = self.open_stream(sql, params);
        self.record(result)
    }

    fn open_stream(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<RowStream<'db>, SqlMiddlewareDbError> {
        let mut stmt = self.raw.prepare(sql).map_err(SqlMiddlewareDbError::prepare)?;
        BoundParams::bind(params).apply(&mut stmt)?;
        self.executed += 1;
        let columns = column_names(&stmt);
        let index = column_index(&columns);
        tracing::trace!(sql, "opened streaming statement");
        Ok(RowStream {
            stmt,
            columns,
            index,
        })
    }
}

/// Owner of a streaming statement. Dropping it releases the statement.
pub struct RowStream<'db> {
    stmt: Statement<'db>,
    columns: Arc<Vec<String>>,
    index: ColumnIndex,
}

impl RowStream<'_> {
    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.columns
    }

    /// Start stepping the statement. Calling this again restarts from the first row.
    pub fn rows(&mut self) -> StreamRows<'_> {
        StreamRows {
            rows: self.stmt.raw_query(),
            columns: &self.columns,
            index: &self.index,
            done: false,
        }
    }

    /// Finalize the statement now, reporting any error `SQLite` returns.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError` if finalizing fails.
    pub fn close(self) -> Result<(), SqlMiddlewareDbError> {
        self.stmt.finalize().map_err(SqlMiddlewareDbError::execution)
    }
}

/// Lazy row iterator borrowed from a [`RowStream`].
pub struct StreamRows<'s> {
    rows: Rows<'s>,
    columns: &'s Arc<Vec<String>>,
    index: &'s ColumnIndex,
    done: bool,
}

impl Iterator for StreamRows<'_> {
    type Item = Result<CustomDbRow, SqlMiddlewareDbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rows.next() {
            Ok(Some(row)) => Some(extract_row(row, self.columns, self.index)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(SqlMiddlewareDbError::execution(err)))
            }
        }
    }
}
