//! Convenient imports for common functionality.

pub use crate::error::SqlMiddlewareDbError;
pub use crate::identifier::{quote_identifier, quote_path};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::sqlite::{
    AsyncConnection, BatchRow, CLIENT_ERROR_CODE, Connection, Database, InsertStrategy, RowStream, SqliteOptions,
    SqliteOptionsBuilder, StatementOutcome, TransactionState,
};
pub use crate::types::RowValues;
