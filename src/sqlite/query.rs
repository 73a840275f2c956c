use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlMiddlewareDbError;
use crate::results::{ColumnIndex, CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlMiddlewareDbError> {
    let value: Value = row.get(idx).map_err(SqlMiddlewareDbError::execution)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

pub(crate) fn extract_row(
    row: &rusqlite::Row,
    columns: &Arc<Vec<String>>,
    index: &ColumnIndex,
) -> Result<CustomDbRow, SqlMiddlewareDbError> {
    let values = (0..columns.len())
        .map(|i| sqlite_extract_value_sync(row, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CustomDbRow::with_index(
        Arc::clone(columns),
        Arc::clone(index),
        values,
    ))
}

pub(crate) fn column_names(stmt: &Statement<'_>) -> Arc<Vec<String>> {
    Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    )
}

/// Step an already-bound statement to completion and materialize its rows.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ExecutionError` if stepping fails or a value cannot be read.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlMiddlewareDbError> {
    let columns = column_names(stmt);
    let col_count = columns.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(columns);

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(SqlMiddlewareDbError::execution)? {
        let values = (0..col_count)
            .map(|i| sqlite_extract_value_sync(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        result_set.add_row_values(values);
    }

    Ok(result_set)
}

/// First keyword of a statement, uppercased, skipping leading whitespace and comments.
pub(crate) fn leading_keyword(sql: &str) -> String {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail).trim_start();
        } else {
            break;
        }
    }
    rest.split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

/// Whether `sqlite3_changes` describes this statement. Only INSERT, UPDATE and DELETE
/// (possibly behind a CTE) update it; after anything else it still holds the previous count.
pub(crate) fn reports_changes(sql: &str) -> bool {
    matches!(
        leading_keyword(sql).as_str(),
        "INSERT" | "UPDATE" | "DELETE" | "REPLACE" | "WITH"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_skips_whitespace_and_comments() {
        assert_eq!(leading_keyword("  insert into t values (1)"), "INSERT");
        assert_eq!(leading_keyword("-- note\n/* x */ DELETE FROM t"), "DELETE");
        assert_eq!(leading_keyword("ROLLBACK;"), "ROLLBACK");
        assert_eq!(leading_keyword(""), "");
    }

    #[test]
    fn only_dml_reports_changes() {
        assert!(reports_changes("UPDATE t SET a = 1"));
        assert!(reports_changes("WITH x AS (SELECT 1) INSERT INTO t SELECT * FROM x"));
        assert!(!reports_changes("DROP TABLE t"));
        assert!(!reports_changes("CREATE INDEX i ON t (a)"));
        assert!(!reports_changes("COMMIT"));
    }
}
