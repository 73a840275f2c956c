use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlMiddlewareDbError;
use crate::types::RowValues;

/// Text form timestamps are bound as.
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Wire type a bound value travels as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Integer,
    Double,
    Text,
    Blob,
}

impl WireType {
    /// One-letter tag (`i`, `d`, `s`, `b`).
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            WireType::Integer => 'i',
            WireType::Double => 'd',
            WireType::Text => 's',
            WireType::Blob => 'b',
        }
    }
}

/// Convert a single `RowValues` into its wire type and a rusqlite `Value`.
///
/// NULL travels as text so a nullable integer column is never coerced to zero.
#[must_use]
pub fn bind_value(value: &RowValues) -> (WireType, Value) {
    match value {
        RowValues::Null => (WireType::Text, Value::Null),
        RowValues::Int(i) => (WireType::Integer, Value::Integer(*i)),
        RowValues::Float(f) => (WireType::Double, Value::Real(*f)),
        RowValues::Bool(b) => (WireType::Integer, Value::Integer(i64::from(*b))),
        RowValues::Text(s) => (WireType::Text, Value::Text(s.clone())),
        RowValues::Blob(bytes) => (WireType::Blob, Value::Blob(bytes.clone())),
        RowValues::Timestamp(dt) => (
            WireType::Text,
            Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        ),
        RowValues::JSON(json) => (WireType::Text, Value::Text(json.to_string())),
    }
}

/// Positional parameters converted for one execution of a statement.
#[derive(Debug, Clone, Default)]
pub struct BoundParams {
    types: Vec<WireType>,
    values: Vec<Value>,
}

impl BoundParams {
    /// Convert middleware values, preserving placeholder order.
    #[must_use]
    pub fn bind(params: &[RowValues]) -> Self {
        Self::bind_refs(params)
    }

    /// Convert borrowed values, e.g. a batch row projected onto a column order.
    pub fn bind_refs<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = &'a RowValues>,
    {
        let (types, values) = params.into_iter().map(bind_value).unzip();
        Self { types, values }
    }

    #[must_use]
    pub fn types(&self) -> &[WireType] {
        &self.types
    }

    /// Wire types as a tag string, e.g. `"isd"`.
    #[must_use]
    pub fn type_tags(&self) -> String {
        self.types.iter().map(|ty| ty.tag()).collect()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bind onto a compiled statement.
    ///
    /// The placeholder count is checked even when there is nothing to bind: `SQLite` would
    /// otherwise run the statement with NULL in every unbound slot.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::BindError` on a count mismatch, or the driver error
    /// raised while binding a value.
    pub fn apply(&self, stmt: &mut Statement<'_>) -> Result<(), SqlMiddlewareDbError> {
        let expected = stmt.parameter_count();
        if expected != self.values.len() {
            return Err(SqlMiddlewareDbError::BindError(format!(
                "statement expects {expected} parameters, {} supplied",
                self.values.len()
            )));
        }
        for (idx, value) in self.values.iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, value)
                .map_err(SqlMiddlewareDbError::execution)?;
        }
        Ok(())
    }
}
