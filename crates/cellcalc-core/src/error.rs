//! Errors for A1-style address and range text

use crate::MAX_ROWS;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Address or range text that does not name a cell of a sheet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid cell address '{text}': {reason}")]
    InvalidAddress { text: String, reason: &'static str },

    #[error("Invalid cell range '{text}': {source}")]
    InvalidRange {
        text: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Row {row} is past the last row ({})", MAX_ROWS)]
    RowOutOfBounds { row: u64 },

    #[error("Column {letters} is past the last column (XFD)")]
    ColumnOutOfBounds { letters: String },
}

impl Error {
    pub(crate) fn address(text: &str, reason: &'static str) -> Self {
        Error::InvalidAddress {
            text: text.to_string(),
            reason,
        }
    }
}
