//! Prelude module - common imports for cellcalc users
//!
//! ```rust
//! use cellcalc::prelude::*;
//! ```

pub use crate::{
    // Service entry points
    evaluate_with_sample,
    validate_syntax,

    // Calculation types
    CalculationOptions,
    CalculationStats,

    CellAddress,
    CellError,
    CellRange,
    // Cell types
    CellValue,
    ErrorKind,

    // Error types
    Error,
    EvaluationOutcome,
    FormulaValue,
    Result,
    ResultValue,

    ServiceConfig,
    Sheet,
    SyntaxCheck,

    // Tool surface
    ToolCatalog,
    Validator,
};
