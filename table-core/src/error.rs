//! FILENAME: table-core/src/error.rs

use thiserror::Error;

/// Which kind of named processing function failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    Filter,
    Sort,
    Aggregation,
}

impl std::fmt::Display for FnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FnKind::Filter => write!(f, "filter"),
            FnKind::Sort => write!(f, "sort"),
            FnKind::Aggregation => write!(f, "aggregation"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("State slice '{slice}' is declared by features '{first}' and '{second}' with different shapes")]
    DuplicateStateSlice {
        slice: String,
        first: String,
        second: String,
    },

    #[error("Feature '{0}' is registered more than once")]
    DuplicateFeature(String),

    #[error("Column definition at {0} has no id, accessor key, or header to derive one from")]
    MissingColumnId(String),

    #[error("Column id '{0}' is used by more than one column")]
    DuplicateColumnId(String),

    #[error("Unknown {kind} function '{name}' (column: {column})")]
    UnresolvedFunction {
        kind: FnKind,
        name: String,
        column: String,
    },

    #[error("Accessor for column '{column}' failed on row '{row}': {message}")]
    Accessor {
        column: String,
        row: String,
        message: String,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("State slice '{slice}' failed to serialize: {message}")]
    StateSerialization { slice: String, message: String },
}

/// Error returned by user-supplied accessor functions on malformed records.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct AccessorError {
    pub message: String,
}

impl AccessorError {
    pub fn new(message: impl Into<String>) -> Self {
        AccessorError {
            message: message.into(),
        }
    }
}

impl From<String> for AccessorError {
    fn from(message: String) -> Self {
        AccessorError { message }
    }
}

impl From<&str> for AccessorError {
    fn from(message: &str) -> Self {
        AccessorError::new(message)
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
