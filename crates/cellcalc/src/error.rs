//! Error types for the cellcalc facade

use cellcalc_formula::FormulaError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by recalculation, validation and configuration loading
///
/// Spreadsheet error values are not errors here; they are ordinary results.
#[derive(Debug, Error)]
pub enum Error {
    /// Data model error (bad address or range text)
    #[error(transparent)]
    Core(#[from] cellcalc_core::Error),

    /// Parse failure or fatal evaluation failure
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration or input JSON is malformed
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
