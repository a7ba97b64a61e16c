//! Formula error types
//!
//! Spreadsheet errors (`#DIV/0!`, `#N/A`, ...) are values, not Rust errors:
//! they travel inside [`FormulaValue::Error`](crate::FormulaValue::Error).
//! [`FormulaError`] covers the two failure classes that stop evaluation
//! outright: text that is not a formula, and resource limits.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula text is not well-formed
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Character offset into the (trimmed) formula text
        position: usize,
        /// What was wrong
        message: String,
    },

    /// Evaluation recursed deeper than the configured limit
    #[error("Evaluation exceeded the maximum {what} depth of {limit}")]
    DepthExceeded {
        /// Which limit was hit ("function call" or "expression")
        what: &'static str,
        /// The configured limit
        limit: usize,
    },
}

impl FormulaError {
    /// Create a parse error
    pub fn parse<S: Into<String>>(position: usize, message: S) -> Self {
        FormulaError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Whether this is a parse error (as opposed to a fatal evaluation failure)
    pub fn is_parse_error(&self) -> bool {
        matches!(self, FormulaError::Parse { .. })
    }
}
