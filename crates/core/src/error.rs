//! Error types for the counter-series system.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Counter, Second};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the counter-series system.
#[derive(Error, Debug)]
pub enum Error {
    /// Source is structurally invalid (missing header or columns).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A source cell could not be converted to its expected type.
    #[error("Parse error at row {row}, column '{column}': {reason} (value: '{value}')")]
    Parse {
        /// 1-based data row, header excluded.
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// No events to aggregate.
    #[error("Empty input: no events to aggregate")]
    EmptyInput,

    /// Dated events span more than one calendar day.
    #[error("Multi-day input: events dated {first} and {other}; second offsets are time-of-day only")]
    MultiDayInput { first: NaiveDate, other: NaiveDate },

    /// A per-second or cumulative sum exceeded u64.
    #[error("Counter {counter} overflowed at second {second}")]
    Overflow { counter: Counter, second: Second },

    /// Unknown or expired session identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (serialized table violates table invariants).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed input error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }

    /// Create a cell parse error.
    pub fn parse(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Parse {
            row,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a session not found error.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Error::SessionNotFound(id.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Row index for parse errors.
    pub fn row(&self) -> Option<usize> {
        match self {
            Error::Parse { row, .. } => Some(*row),
            _ => None,
        }
    }
}
