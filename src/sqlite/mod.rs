// SQLite backend.
//
// - database: opening and closing the engine handle
// - connection: the session (statement cache, executors, batch insert, scripts, transactions)
// - cache: bounded FIFO cache of compiled statements
// - params: conversion of middleware values into bound parameters
// - query: result extraction and building
// - worker: async facade running one session on a dedicated thread

pub mod cache;
pub mod config;
pub mod connection;
pub mod database;
pub mod params;
pub mod query;
pub mod worker;

pub use cache::{CacheStats, StatementCache, StatementHandle};
pub use config::{DEFAULT_STATEMENT_CACHE_CAPACITY, SqliteOptions, SqliteOptionsBuilder};
pub use connection::{
    BATCH_CHUNK_ROWS, BATCH_ROW_LIMIT, BATCH_SIZE_LIMIT, BatchRow, CLIENT_ERROR_CODE, Connection,
    InsertPlan,
    InsertStrategy, LastError, MAX_BOUND_PARAMETERS, RowStream, StatementOutcome, StreamRows,
    TransactionState, estimate_payload_bytes, plan_insert,
};
pub use database::Database;
pub use params::{BoundParams, WireType, bind_value};
pub use query::build_result_set;
pub use worker::AsyncConnection;
