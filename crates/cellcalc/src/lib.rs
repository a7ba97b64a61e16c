//! # cellcalc
//!
//! Spreadsheet formula evaluation over tabular data.
//!
//! cellcalc parses Excel-style formulas, evaluates them against a sheet built
//! from caller rows, and reports either a value or an error. It is meant to
//! sit behind a service or tool-calling layer that validates formulas before
//! they are shown to a user.
//!
//! ## Features
//!
//! - Formula parsing and evaluation with Excel operator precedence
//! - A built-in function library (aggregation, lookup, logical, text, date,
//!   financial, math and statistics)
//! - Recalculation of formula cells in caller data, with cycle detection
//! - A validation service separating spreadsheet errors from invalid formulas
//! - A JSON tool catalog with one tool per function
//!
//! ## Example
//!
//! ```rust
//! use cellcalc::prelude::*;
//!
//! let headers = vec!["region".to_string(), "sales".to_string()];
//! let rows = vec![
//!     vec![CellValue::from("north"), CellValue::from(120)],
//!     vec![CellValue::from("south"), CellValue::from(80)],
//! ];
//!
//! let outcome = evaluate_with_sample("=SUMIF(A2:A3,\"north\",B2:B3)", &headers, &rows);
//! assert_eq!(outcome, EvaluationOutcome::Value(ResultValue::Number(120.0)));
//!
//! // Spreadsheet errors are results, not invalid formulas
//! assert!(validate_syntax("=1/0").is_valid);
//! assert!(!validate_syntax("=SUM(1,").is_valid);
//! ```

pub mod calculation;
pub mod config;
pub mod error;
pub mod prelude;
pub mod tools;
pub mod validation;

pub use calculation::{recalculate, CalculationOptions, CalculationStats};
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use tools::{ToolCatalog, ToolDescriptor, ToolError};
pub use validation::{
    evaluate_with_sample, validate_syntax, EvaluationOutcome, Rejection, RejectionKind,
    ResultValue, SampleGrid, SyntaxCheck, Validator,
};

// Re-export core types
pub use cellcalc_core::{
    CellAddress, CellError, CellRange, CellValue, ErrorKind, Sheet, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use cellcalc_formula::{
    evaluate, parse_formula, ArgKind, EvaluationContext, EvaluationOptions, FormulaError,
    FormulaExpr, FormulaResult, FormulaValue, FunctionCategory, FunctionDef, FunctionRegistry,
};
