use indexmap::IndexMap;

use crate::error::SqlMiddlewareDbError;
use crate::identifier::{quote_identifier, quote_path};
use crate::sqlite::params::{BoundParams, TIMESTAMP_FORMAT};
use crate::types::RowValues;

use super::Connection;

/// Most rows sent as one multi-row INSERT.
pub const BATCH_ROW_LIMIT: usize = 1000;
/// Largest estimated payload sent as one multi-row INSERT.
pub const BATCH_SIZE_LIMIT: usize = 4 * 1024 * 1024;
/// Rows per chunk on the chunked path.
pub const BATCH_CHUNK_ROWS: usize = 1000;
/// `SQLite`'s default limit on host parameters in one statement.
pub const MAX_BOUND_PARAMETERS: usize = 32_766;

const NON_TEXT_VALUE_BYTES: usize = 8;
const ROW_OVERHEAD_BYTES: usize = 4;

/// One row of a batch insert: column name to value, in column order.
pub type BatchRow = IndexMap<String, RowValues>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// One INSERT carrying every row.
    MultiRow,
    /// A single-row INSERT executed once per row inside one transaction.
    Chunked { chunks: usize },
}

/// How a batch insert will be carried out. Built without touching the database.
#[derive(Debug, Clone)]
pub struct InsertPlan {
    table: String,
    columns: Vec<String>,
    quoted_columns: Vec<String>,
    row_count: usize,
    estimated_bytes: usize,
    strategy: InsertStrategy,
}

impl InsertPlan {
    #[must_use]
    pub fn strategy(&self) -> InsertStrategy {
        self.strategy
    }

    /// Column order, fixed by the first row.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn estimated_bytes(&self) -> usize {
        self.estimated_bytes
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)`
    #[must_use]
    pub fn single_row_sql(&self) -> String {
        self.insert_sql(1)
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?), ...` with one group per planned row.
    #[must_use]
    pub fn multi_row_sql(&self) -> String {
        self.insert_sql(self.row_count)
    }

    fn insert_sql(&self, groups: usize) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let group = format!("({placeholders})");
        let values = vec![group.as_str(); groups].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES {values}",
            self.table,
            self.quoted_columns.join(", ")
        )
    }

    fn row_values<'r>(
        &self,
        row: &'r BatchRow,
    ) -> Result<Vec<&'r RowValues>, SqlMiddlewareDbError> {
        self.columns
            .iter()
            .map(|column| {
                row.get(column).ok_or_else(|| {
                    SqlMiddlewareDbError::ValidationError(format!(
                        "batch row is missing column {column:?}"
                    ))
                })
            })
            .collect()
    }
}

/// Estimated payload of a batch: byte length for every value bound as text or binary
/// (JSON and timestamps included), a fixed charge for every other value, plus a fixed
/// per-row overhead.
#[must_use]
pub fn estimate_payload_bytes(rows: &[BatchRow]) -> usize {
    rows.iter()
        .map(|row| {
            row.values()
                .map(|value| match value {
                    RowValues::Text(s) => s.len(),
                    RowValues::Blob(bytes) => bytes.len(),
                    RowValues::JSON(json) => json.to_string().len(),
                    RowValues::Timestamp(dt) => dt.format(TIMESTAMP_FORMAT).to_string().len(),
                    _ => NON_TEXT_VALUE_BYTES,
                })
                .sum::<usize>()
                + ROW_OVERHEAD_BYTES
        })
        .sum()
}

/// Validate a batch and choose how to insert it.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ValidationError` if `rows` is empty, the first row has no
/// columns, any row's column set differs from the first row's, or an identifier is invalid.
pub fn plan_insert(table: &str, rows: &[BatchRow]) -> Result<InsertPlan, SqlMiddlewareDbError> {
    let first = rows.first().ok_or_else(|| {
        SqlMiddlewareDbError::ValidationError("batch insert needs at least one row".into())
    })?;
    if first.is_empty() {
        return Err(SqlMiddlewareDbError::ValidationError(
            "batch insert rows must have at least one column".into(),
        ));
    }
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if row.len() != first.len() || !first.keys().all(|key| row.contains_key(key)) {
            return Err(SqlMiddlewareDbError::ValidationError(format!(
                "batch row {idx} has a different column set than row 0"
            )));
        }
    }

    let table = quote_path(table)?;
    let columns: Vec<String> = first.keys().cloned().collect();
    let quoted_columns = columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?;

    let row_count = rows.len();
    let estimated_bytes = estimate_payload_bytes(rows);
    let strategy = if row_count <= BATCH_ROW_LIMIT
        && estimated_bytes <= BATCH_SIZE_LIMIT
        && row_count * columns.len() <= MAX_BOUND_PARAMETERS
    {
        InsertStrategy::MultiRow
    } else {
        InsertStrategy::Chunked {
            chunks: row_count.div_ceil(BATCH_CHUNK_ROWS),
        }
    };

    Ok(InsertPlan {
        table,
        columns,
        quoted_columns,
        row_count,
        estimated_bytes,
        strategy,
    })
}

impl Connection<'_> {
    /// Insert `rows` into `table`, choosing between one multi-row INSERT and a chunked,
    /// transactional sequence of single-row INSERTs.
    ///
    /// Every row must carry the same column set; the column order of the first row is used.
    /// The chunked path opens its own transaction, so it must not be called while a
    /// transaction is already active on this connection.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ValidationError` before any SQL is issued if the batch
    /// is malformed. Execution failures on the chunked path roll the whole batch back.
    pub fn insert_batch(
        &mut self,
        table: &str,
        rows: &[BatchRow],
    ) -> Result<usize, SqlMiddlewareDbError> {
        let result = plan_insert(table, rows).and_then(|plan| self.run_insert_plan(&plan, rows));
        self.record(result)
    }

    fn run_insert_plan(
        &mut self,
        plan: &InsertPlan,
        rows: &[BatchRow],
    ) -> Result<usize, SqlMiddlewareDbError> {
        tracing::debug!(
            rows = plan.row_count,
            estimated_bytes = plan.estimated_bytes,
            strategy = ?plan.strategy,
            "batch insert planned"
        );
        match plan.strategy {
            InsertStrategy::MultiRow => {
                let mut values = Vec::with_capacity(plan.row_count * plan.columns.len());
                for row in rows {
                    values.extend(plan.row_values(row)?);
                }
                self.write_cached(&plan.multi_row_sql(), &BoundParams::bind_refs(values))
            }
            InsertStrategy::Chunked { .. } => {
                let sql = plan.single_row_sql();
                self.transaction(|conn| conn.insert_chunks(&sql, plan, rows))
            }
        }
    }

    fn insert_chunks(
        &mut self,
        sql: &str,
        plan: &InsertPlan,
        rows: &[BatchRow],
    ) -> Result<usize, SqlMiddlewareDbError> {
        let mut total = 0;
        for (chunk_no, chunk) in rows.chunks(BATCH_CHUNK_ROWS).enumerate() {
            let mut stmt = self.cache.acquire(self.raw, sql)?;
            for row in chunk {
                BoundParams::bind_refs(plan.row_values(row)?).apply(&mut stmt)?;
                self.executed += 1;
                total += stmt
                    .raw_execute()
                    .map_err(SqlMiddlewareDbError::execution)?;
            }
            tracing::debug!(chunk = chunk_no, rows = chunk.len(), total, "inserted batch chunk");
        }
        self.note_write(total);
        Ok(total)
    }
}
