//! Identifier validation and quoting for generated SQL.
//!
//! Only letters, digits, underscore and dollar sign are accepted, so quoting never has to
//! escape anything.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlMiddlewareDbError;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_$]+$").expect("identifier pattern is a valid regex")
});

/// Validate a single identifier and wrap it in double quotes.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ValidationError` if the identifier is empty or contains
/// characters outside `[A-Za-z0-9_$]`.
pub fn quote_identifier(ident: &str) -> Result<String, SqlMiddlewareDbError> {
    if !IDENTIFIER.is_match(ident) {
        return Err(SqlMiddlewareDbError::ValidationError(format!(
            "invalid identifier {ident:?}: only letters, digits, '_' and '$' are allowed"
        )));
    }
    Ok(format!("\"{ident}\""))
}

/// Quote a dot-separated path (`schema.table`), validating each segment on its own.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::ValidationError` if any segment is invalid.
pub fn quote_path(path: &str) -> Result<String, SqlMiddlewareDbError> {
    let segments = path
        .split('.')
        .map(quote_identifier)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_identifier("users").unwrap(), "\"users\"");
        assert_eq!(quote_identifier("col_$1").unwrap(), "\"col_$1\"");
    }

    #[test]
    fn rejects_disallowed_characters() {
        for bad in ["", "a b", "a;drop", "a\"b", "a-b", "tbl.col"] {
            assert!(
                matches!(
                    quote_identifier(bad),
                    Err(SqlMiddlewareDbError::ValidationError(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn quotes_each_path_segment() {
        assert_eq!(quote_path("main.users").unwrap(), "\"main\".\"users\"");
        assert_eq!(quote_path("users").unwrap(), "\"users\"");
        assert!(quote_path("main..users").is_err());
        assert!(quote_path("main.us ers").is_err());
    }
}
