//! Async facade over a single [`Connection`].
//!
//! The database handle, its session and the session's statement cache live on one
//! dedicated thread. Calls are sent over a channel and answered through a oneshot, so the
//! single-owner rule of `Connection` holds no matter how many tasks share the facade.

mod channel;
mod dispatcher;

use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::sqlite::config::SqliteOptions;
use crate::sqlite::connection::{BatchRow, Connection, StatementOutcome};
use crate::sqlite::database::Database;
use crate::types::RowValues;

use channel::{BoxedCallback, Command};
use dispatcher::run_sqlite_worker;

/// Handle to a worker thread that owns one `SQLite` session.
///
/// Dropping the handle asks the worker to release its cached statements and close the
/// database; [`AsyncConnection::close`] does the same and waits for the outcome.
#[derive(Debug)]
pub struct AsyncConnection {
    sender: Sender<Command>,
}

impl AsyncConnection {
    /// Open the database described by `opts` and hand it to a new worker thread.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConnectionError` if the database cannot be opened or
    /// the thread cannot be spawned.
    pub fn open(opts: SqliteOptions) -> Result<Self, SqlMiddlewareDbError> {
        let name = format!("sqlite-worker-{}", opts.db_path);
        let database = Database::open(opts)?;
        Self::spawn(database, name)
    }

    fn spawn(database: Database, name: String) -> Result<Self, SqlMiddlewareDbError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let handle = Handle::try_current().ok();
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let runtime_guard = handle.as_ref().map(Handle::enter);
                run_sqlite_worker(database, &receiver);
                drop(runtime_guard);
            })
            .map_err(|err| {
                SqlMiddlewareDbError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;
        Ok(Self { sender })
    }

    fn send_command(&self, command: Command) -> Result<(), SqlMiddlewareDbError> {
        self.sender
            .send(command)
            .map_err(|_| connection_error("SQLite worker closed"))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqlMiddlewareDbError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, SqlMiddlewareDbError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| connection_error(drop_message))?
    }

    /// See [`Connection::execute_read`].
    ///
    /// # Errors
    /// Returns the session's error, or `ConnectionError` if the worker is gone.
    pub async fn execute_read(
        &self,
        sql: impl Into<String>,
        params: Vec<RowValues>,
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        let sql = sql.into();
        self.request(
            |respond_to| Command::ExecuteRead {
                sql,
                params,
                respond_to,
            },
            "SQLite worker dropped while executing read",
        )
        .await
    }

    /// See [`Connection::execute_write`].
    ///
    /// # Errors
    /// Returns the session's error, or `ConnectionError` if the worker is gone.
    pub async fn execute_write(
        &self,
        sql: impl Into<String>,
        params: Vec<RowValues>,
    ) -> Result<usize, SqlMiddlewareDbError> {
        let sql = sql.into();
        self.request(
            |respond_to| Command::ExecuteWrite {
                sql,
                params,
                respond_to,
            },
            "SQLite worker dropped while executing write",
        )
        .await
    }

    /// See [`Connection::insert_batch`].
    ///
    /// # Errors
    /// Returns the session's error, or `ConnectionError` if the worker is gone.
    pub async fn insert_batch(
        &self,
        table: impl Into<String>,
        rows: Vec<BatchRow>,
    ) -> Result<usize, SqlMiddlewareDbError> {
        let table = table.into();
        self.request(
            |respond_to| Command::InsertBatch {
                table,
                rows,
                respond_to,
            },
            "SQLite worker dropped while inserting batch",
        )
        .await
    }

    /// See [`Connection::execute_script`].
    ///
    /// # Errors
    /// Returns the session's error, or `ConnectionError` if the worker is gone.
    pub async fn execute_script(
        &self,
        script: impl Into<String>,
    ) -> Result<Vec<StatementOutcome>, SqlMiddlewareDbError> {
        let script = script.into();
        self.request(
            |respond_to| Command::ExecuteScript { script, respond_to },
            "SQLite worker dropped while executing script",
        )
        .await
    }

    /// # Errors
    /// Returns `ConnectionError` if the worker is gone.
    pub async fn set_statement_cache_capacity(
        &self,
        capacity: usize,
    ) -> Result<(), SqlMiddlewareDbError> {
        self.request(
            |respond_to| Command::SetCacheCapacity {
                capacity,
                respond_to,
            },
            "SQLite worker dropped while resizing statement cache",
        )
        .await
    }

    /// Run `func` on the worker thread with the session itself.
    ///
    /// # Errors
    /// Returns the error produced by `func`, or `ConnectionError` if the worker is gone.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlMiddlewareDbError>
    where
        F: FnOnce(&mut Connection<'_>) -> Result<R, SqlMiddlewareDbError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: BoxedCallback = Box::new(move |conn: &mut Connection<'_>| {
            func(conn).map(|value| Box::new(value) as Box<dyn std::any::Any + Send>)
        });
        self.send_command(Command::WithConnection {
            callback,
            respond_to: tx,
        })?;
        match rx.await {
            Ok(Ok(payload)) => payload.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
                SqlMiddlewareDbError::Other("SQLite worker response downcast failure".into())
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(connection_error(
                "SQLite worker dropped while handling custom callback",
            )),
        }
    }

    /// Run `func` inside a transaction on the worker; see [`Connection::transaction`].
    ///
    /// # Errors
    /// Returns the error produced by `func` after rolling back, or the begin/commit failure.
    pub async fn transaction<F, R>(&self, func: F) -> Result<R, SqlMiddlewareDbError>
    where
        F: FnOnce(&mut Connection<'_>) -> Result<R, SqlMiddlewareDbError> + Send + 'static,
        R: Send + 'static,
    {
        self.with_connection(move |conn| conn.transaction(func)).await
    }

    /// Stop the worker, releasing its cached statements and closing the database.
    ///
    /// # Errors
    /// Returns the error `SQLite` reported while closing, or `ConnectionError` if the worker
    /// was already gone.
    pub async fn close(self) -> Result<(), SqlMiddlewareDbError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Shutdown {
            respond_to: Some(tx),
        })?;
        rx.await
            .map_err(|_| connection_error("SQLite worker dropped while closing"))?
    }
}

impl Drop for AsyncConnection {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown { respond_to: None });
    }
}

fn connection_error(message: &str) -> SqlMiddlewareDbError {
    SqlMiddlewareDbError::ConnectionError(message.into())
}
