use std::sync::mpsc::Receiver;

use crate::sqlite::connection::Connection;
use crate::sqlite::database::Database;

use super::channel::{BoxedCallback, BoxedResponse, Command};

/// Serve commands against one session until shutdown or until every sender is gone.
pub(super) fn run_sqlite_worker(mut database: Database, receiver: &Receiver<Command>) {
    let mut conn = database.connect();
    let mut shutdown_reply = None;
    tracing::debug!("SQLite worker started");

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown { respond_to } => {
                shutdown_reply = respond_to;
                break;
            }
            Command::ExecuteRead {
                sql,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(conn.execute_read(&sql, &params));
            }
            Command::ExecuteWrite {
                sql,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(conn.execute_write(&sql, &params));
            }
            Command::InsertBatch {
                table,
                rows,
                respond_to,
            } => {
                let _ = respond_to.send(conn.insert_batch(&table, &rows));
            }
            Command::ExecuteScript { script, respond_to } => {
                let _ = respond_to.send(conn.execute_script(&script));
            }
            Command::SetCacheCapacity {
                capacity,
                respond_to,
            } => {
                conn.set_statement_cache_capacity(capacity);
                let _ = respond_to.send(Ok(()));
            }
            Command::WithConnection {
                callback,
                respond_to,
            } => {
                let _ = respond_to.send(run_custom_callback(&mut conn, callback));
            }
        }
    }

    conn.close();
    let closed = database.close();
    if let Err(err) = &closed {
        tracing::warn!(error = %err, "SQLite worker failed to close its database");
    }
    tracing::debug!(closed = closed.is_ok(), "SQLite worker stopped");
    if let Some(reply) = shutdown_reply {
        let _ = reply.send(closed);
    }
}

fn run_custom_callback(conn: &mut Connection<'_>, callback: BoxedCallback) -> BoxedResponse {
    let result = callback(conn);
    if let Err(err) = &result {
        tracing::debug!(error = %err, "SQLite worker callback failed");
    }
    result
}
