use rusqlite::Batch;

use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::sqlite::query::{build_result_set, reports_changes};

use super::Connection;

/// Outcome of one statement of a script, in script order.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    /// The statement produced a result set (possibly empty).
    Rows(ResultSet),
    /// The statement ran without returning columns.
    Done { rows_affected: usize },
}

impl StatementOutcome {
    #[must_use]
    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            StatementOutcome::Rows(rs) => Some(rs),
            StatementOutcome::Done { .. } => None,
        }
    }

    #[must_use]
    pub fn rows_affected(&self) -> usize {
        match self {
            StatementOutcome::Rows(rs) => rs.rows_affected,
            StatementOutcome::Done { rows_affected } => *rows_affected,
        }
    }
}

impl Connection<'_> {
    /// Run a script of `;`-separated literal statements, collecting one outcome per
    /// statement.
    ///
    /// No parameters are bound on this path. Statements that completed before a failure keep
    /// their effects; the statements after it are discarded without being run, and the
    /// connection is usable for the next call either way.
    ///
    /// `BEGIN`, `COMMIT` and `ROLLBACK` inside the script move
    /// [`transaction_state`](Self::transaction_state) the same way the coordinator's own
    /// calls do. Statements other than INSERT/UPDATE/DELETE report `rows_affected: 0`.
    ///
    /// # Errors
    /// Returns the `PrepareError` or `ExecutionError` of the first statement that failed.
    pub fn execute_script(
        &mut self,
        script: &str,
    ) -> Result<Vec<StatementOutcome>, SqlMiddlewareDbError> {
        let mut outcomes = Vec::new();
        let result = self.run_script(script, &mut outcomes);
        match &result {
            Ok(()) => {
                tracing::debug!(statements = outcomes.len(), "script completed");
            }
            Err(err) => {
                self.sync_transaction_state();
                tracing::warn!(
                    completed = outcomes.len(),
                    error = %err,
                    "script stopped; remaining statements discarded"
                );
            }
        }
        self.record(result.map(|()| outcomes))
    }

    fn run_script(
        &mut self,
        script: &str,
        outcomes: &mut Vec<StatementOutcome>,
    ) -> Result<(), SqlMiddlewareDbError> {
        let raw = self.raw;
        let mut batch = Batch::new(raw, script);
        while let Some(mut stmt) = batch.next().map_err(SqlMiddlewareDbError::prepare)? {
            self.executed += 1;
            if stmt.column_count() > 0 {
                outcomes.push(StatementOutcome::Rows(build_result_set(&mut stmt)?));
            } else {
                let was_autocommit = raw.is_autocommit();
                let changed = stmt.raw_execute().map_err(SqlMiddlewareDbError::execution)?;
                let sql = stmt.expanded_sql().unwrap_or_default();
                self.track_transaction_boundary(was_autocommit, &sql);
                let rows_affected = if reports_changes(&sql) { changed } else { 0 };
                self.note_write(rows_affected);
                outcomes.push(StatementOutcome::Done { rows_affected });
            }
        }
        Ok(())
    }
}
