//! # cellcalc-formula
//!
//! Formula parser and evaluator for cellcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value) against a [`Sheet`](cellcalc_core::Sheet)
//! - A table of built-in spreadsheet functions with published contracts
//! - Dependency tracking between formula cells
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{CellValue, Sheet};
//! use cellcalc_formula::{evaluate, parse_formula, EvaluationContext, FormulaValue};
//!
//! let sheet = Sheet::new(
//!     vec!["qty".to_string()],
//!     vec![vec![CellValue::from(2)], vec![CellValue::from(3)]],
//! );
//! let ast = parse_formula("=SUM(A1:A2)*10").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::new(&sheet)).unwrap();
//! assert_eq!(result, FormulaValue::Number(50.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod value;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::{CellKey, DependencyGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_to_cell, EvaluationContext, EvaluationOptions, LazyArgs,
};
pub use functions::{ArgKind, FunctionCategory, FunctionDef, FunctionRegistry, Param};
pub use parser::{parse_formula, MAX_AST_DEPTH, MAX_PARSE_DEPTH};
pub use value::FormulaValue;

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use cellcalc_core::{CellValue, ErrorKind, Sheet};

    pub fn eval(formula: &str) -> FormulaValue {
        eval_with(&Sheet::empty(), formula)
    }

    pub fn eval_with(sheet: &Sheet, formula: &str) -> FormulaValue {
        let expr = parse_formula(formula).unwrap();
        evaluate(&expr, &EvaluationContext::new(sheet)).unwrap()
    }

    /// Sheet from cell texts, data starting at A1
    pub fn grid(rows: &[&[&str]]) -> Sheet {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|text| cell(text)).collect())
            .collect();
        Sheet::new(Vec::new(), rows)
    }

    fn cell(text: &str) -> CellValue {
        if text.is_empty() {
            return CellValue::Blank;
        }
        if let Some(kind) = ErrorKind::parse(text) {
            return CellValue::error(kind);
        }
        if text.eq_ignore_ascii_case("TRUE") {
            return CellValue::Boolean(true);
        }
        if text.eq_ignore_ascii_case("FALSE") {
            return CellValue::Boolean(false);
        }
        match text.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::text(text),
        }
    }

    pub fn num(n: f64) -> FormulaValue {
        FormulaValue::Number(n)
    }

    #[track_caller]
    pub fn approx(value: &FormulaValue, expected: f64) {
        match value {
            FormulaValue::Number(n) => {
                let tolerance = 1e-7 * expected.abs().max(1.0);
                assert!(
                    (n - expected).abs() <= tolerance,
                    "expected {} but got {}",
                    expected,
                    n
                );
            }
            other => panic!("expected a number near {} but got {:?}", expected, other),
        }
    }
}
