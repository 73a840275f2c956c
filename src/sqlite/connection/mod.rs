mod batch;
mod core;
mod dml;
mod script;
mod select;
mod tx;

pub use batch::{
    BATCH_CHUNK_ROWS, BATCH_ROW_LIMIT, BATCH_SIZE_LIMIT, BatchRow, InsertPlan, InsertStrategy,
    MAX_BOUND_PARAMETERS, estimate_payload_bytes, plan_insert,
};
pub use self::core::{CLIENT_ERROR_CODE, Connection, LastError};
pub use script::StatementOutcome;
pub use select::{RowStream, StreamRows};
pub use tx::TransactionState;
