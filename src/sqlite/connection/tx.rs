use crate::error::SqlMiddlewareDbError;
use crate::sqlite::query::leading_keyword;

use super::Connection;

/// Transaction state of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction has been started on this connection.
    #[default]
    None,
    Active,
    Committed,
    RolledBack,
}

impl Connection<'_> {
    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.tx_state
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx_state == TransactionState::Active
    }

    /// Begin a transaction.
    ///
    /// Transactions do not nest; beginning while one is active is a caller error, which
    /// `SQLite` itself rejects.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ExecutionError` if `SQLite` cannot start the transaction.
    pub fn begin(&mut self) -> Result<(), SqlMiddlewareDbError> {
        let result = self.control("BEGIN");
        if result.is_ok() {
            self.tx_state = TransactionState::Active;
            tracing::debug!("transaction started");
        }
        self.record(result)
    }

    /// Commit the active transaction.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ExecutionError` if the commit fails; the transaction is
    /// then still active.
    pub fn commit(&mut self) -> Result<(), SqlMiddlewareDbError> {
        let result = self.control("COMMIT");
        if result.is_ok() {
            self.tx_state = TransactionState::Committed;
            tracing::debug!("transaction committed");
        }
        self.record(result)
    }

    /// Roll back the active transaction.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ExecutionError` if the rollback fails.
    pub fn rollback(&mut self) -> Result<(), SqlMiddlewareDbError> {
        let result = self.control("ROLLBACK");
        if result.is_ok() {
            self.tx_state = TransactionState::RolledBack;
            tracing::debug!("transaction rolled back");
        }
        self.record(result)
    }

    /// Run `func` inside a transaction: commit when it returns `Ok`, roll back when it
    /// returns `Err`.
    ///
    /// The error returned by `func` reaches the caller unchanged; a rollback failure on that
    /// path is only logged. If the commit itself fails the transaction is rolled back and the
    /// commit error is returned.
    ///
    /// # Errors
    /// Returns the error produced by `func`, or the begin/commit failure converted into `E`.
    pub fn transaction<T, E, F>(&mut self, func: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<SqlMiddlewareDbError>,
    {
        self.begin()?;
        match func(self) {
            Ok(value) => {
                if let Err(commit_err) = self.commit() {
                    self.rollback_after_failure();
                    return Err(commit_err.into());
                }
                Ok(value)
            }
            Err(err) => {
                self.rollback_after_failure();
                Err(err)
            }
        }
    }

    /// Roll back on a failure path without replacing the failure being reported.
    pub(crate) fn rollback_after_failure(&mut self) {
        if self.raw.is_autocommit() {
            // SQLite already ended it (SQLITE_FULL, SQLITE_IOERR, ...).
            self.tx_state = TransactionState::RolledBack;
            return;
        }
        match self.control("ROLLBACK") {
            Ok(()) => {
                self.tx_state = TransactionState::RolledBack;
                tracing::debug!("transaction rolled back after failure");
            }
            Err(err) => {
                tracing::warn!(error = %err, "rollback after failure did not succeed");
            }
        }
    }

    /// Mark a coordinator transaction as rolled back when `SQLite` has ended it on its own.
    pub(crate) fn sync_transaction_state(&mut self) {
        if self.tx_state == TransactionState::Active && self.raw.is_autocommit() {
            tracing::warn!("SQLite ended the active transaction; marking it rolled back");
            self.tx_state = TransactionState::RolledBack;
        }
    }

    /// Follow a transaction boundary crossed by a literal statement (`BEGIN`, `COMMIT`,
    /// `ROLLBACK`, `SAVEPOINT`, `RELEASE`) run outside the coordinator.
    pub(crate) fn track_transaction_boundary(&mut self, was_autocommit: bool, sql: &str) {
        match (was_autocommit, self.raw.is_autocommit()) {
            (true, false) => {
                self.tx_state = TransactionState::Active;
                tracing::debug!("transaction started by statement");
            }
            (false, true) => {
                self.tx_state = if leading_keyword(sql) == "ROLLBACK" {
                    TransactionState::RolledBack
                } else {
                    TransactionState::Committed
                };
                tracing::debug!(state = ?self.tx_state, "transaction ended by statement");
            }
            _ => {}
        }
    }

    fn control(&mut self, sql: &str) -> Result<(), SqlMiddlewareDbError> {
        self.executed += 1;
        self.raw
            .execute_batch(sql)
            .map_err(SqlMiddlewareDbError::execution)
    }
}
