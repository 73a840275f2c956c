use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlMiddlewareDbError {
    #[error("Prepare error ({code}): {message}")]
    PrepareError { code: i32, message: String },

    #[error("Parameter binding error: {0}")]
    BindError(String),

    #[error("SQL execution error ({code}): {message}")]
    ExecutionError { code: i32, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlMiddlewareDbError {
    /// Classify a driver error raised while compiling SQL text.
    pub(crate) fn prepare(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, message) => Self::PrepareError {
                code: failure.extended_code,
                message: message.unwrap_or_else(|| failure.to_string()),
            },
            rusqlite::Error::SqlInputError { error, msg, .. } => Self::PrepareError {
                code: error.extended_code,
                message: msg,
            },
            other => Self::SqliteError(other),
        }
    }

    /// Classify a driver error raised while binding or stepping a compiled statement.
    pub(crate) fn execution(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidParameterCount(supplied, expected) => Self::BindError(format!(
                "statement expects {expected} parameters, {supplied} supplied"
            )),
            rusqlite::Error::SqliteFailure(failure, message) => Self::ExecutionError {
                code: failure.extended_code,
                message: message.unwrap_or_else(|| failure.to_string()),
            },
            other => Self::SqliteError(other),
        }
    }

    /// Server-side code and message, when the failure came from the engine.
    #[must_use]
    pub fn server_error(&self) -> Option<(i32, &str)> {
        match self {
            Self::PrepareError { code, message } | Self::ExecutionError { code, message } => {
                Some((*code, message.as_str()))
            }
            Self::SqliteError(rusqlite::Error::SqliteFailure(failure, message)) => Some((
                failure.extended_code,
                message.as_deref().unwrap_or("sqlite failure"),
            )),
            Self::SqliteError(rusqlite::Error::SqlInputError { error, msg, .. }) => {
                Some((error.extended_code, msg.as_str()))
            }
            _ => None,
        }
    }

    /// Server error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.server_error().map(|(code, _)| code)
    }
}
