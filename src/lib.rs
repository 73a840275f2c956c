//! Statement-level middleware for `SQLite`.
//!
//! A [`Connection`](sqlite::Connection) keeps a bounded, insertion-ordered cache of compiled
//! statements and layers typed parameter binding, cached reads and writes, streaming reads,
//! adaptive batch inserts, multi-statement scripts and callback-scoped transactions on top
//! of it. [`AsyncConnection`](sqlite::AsyncConnection) runs one such session on a
//! dedicated thread for async callers.

pub mod error;
pub mod identifier;
pub mod prelude;
pub mod results;
pub mod sqlite;
pub mod types;

pub use error::SqlMiddlewareDbError;
pub use results::{CustomDbRow, ResultSet};
pub use types::RowValues;
