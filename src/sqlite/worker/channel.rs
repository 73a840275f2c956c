use std::any::Any;

use tokio::sync::oneshot;

use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::sqlite::connection::{BatchRow, Connection, StatementOutcome};
use crate::types::RowValues;

pub(super) type BoxedResponse = Result<Box<dyn Any + Send>, SqlMiddlewareDbError>;
pub(super) type BoxedCallback = Box<dyn FnOnce(&mut Connection<'_>) -> BoxedResponse + Send>;

pub(super) enum Command {
    ExecuteRead {
        sql: String,
        params: Vec<RowValues>,
        respond_to: oneshot::Sender<Result<ResultSet, SqlMiddlewareDbError>>,
    },
    ExecuteWrite {
        sql: String,
        params: Vec<RowValues>,
        respond_to: oneshot::Sender<Result<usize, SqlMiddlewareDbError>>,
    },
    InsertBatch {
        table: String,
        rows: Vec<BatchRow>,
        respond_to: oneshot::Sender<Result<usize, SqlMiddlewareDbError>>,
    },
    ExecuteScript {
        script: String,
        respond_to: oneshot::Sender<Result<Vec<StatementOutcome>, SqlMiddlewareDbError>>,
    },
    SetCacheCapacity {
        capacity: usize,
        respond_to: oneshot::Sender<Result<(), SqlMiddlewareDbError>>,
    },
    WithConnection {
        callback: BoxedCallback,
        respond_to: oneshot::Sender<BoxedResponse>,
    },
    Shutdown {
        respond_to: Option<oneshot::Sender<Result<(), SqlMiddlewareDbError>>>,
    },
}
