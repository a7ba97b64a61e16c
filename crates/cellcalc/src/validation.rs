//! Formula validation service
//!
//! Two entry points share one evaluation path: [`validate_syntax`] runs a
//! formula against a small fixed sample grid, [`evaluate_with_sample`]
//! against caller data. A formula that evaluates to a spreadsheet error such
//! as `=1/0` is valid; only text that does not parse and fatal evaluation
//! failures are rejected.

use crate::calculation::recalculate;
use crate::config::ServiceConfig;
use crate::{
    evaluate, parse_formula, CellError, CellValue, EvaluationContext, FormulaExpr, FormulaValue,
    Sheet,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Fixed data used to resolve references when only syntax is checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleGrid {
    /// Header row; empty means the data starts at row 1
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Default for SampleGrid {
    /// 3x3 grid holding 1..9 row by row, without headers
    fn default() -> Self {
        let rows = (0..3_i32)
            .map(|row| (1..=3).map(|col| CellValue::from(row * 3 + col)).collect())
            .collect();
        Self {
            headers: Vec::new(),
            rows,
        }
    }
}

impl SampleGrid {
    pub fn to_sheet(&self) -> Sheet {
        Sheet::from_table(self.headers.clone(), self.rows.clone())
    }
}

/// JSON-friendly form of an evaluation result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    /// Spreadsheet error code such as `#DIV/0!`
    Error(String),
    Array(Vec<Vec<ResultValue>>),
    /// Blank element of an array
    Null,
}

impl ResultValue {
    /// Convert a top-level result; a blank result reports 0
    pub fn from_value(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Blank => ResultValue::Number(0.0),
            other => Self::element(other),
        }
    }

    fn element(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Blank => ResultValue::Null,
            FormulaValue::Number(n) => ResultValue::Number(n),
            FormulaValue::Boolean(b) => ResultValue::Boolean(b),
            FormulaValue::Text(s) => ResultValue::Text(s),
            FormulaValue::Error(e) => ResultValue::Error(e.kind.as_str().to_string()),
            FormulaValue::Array(rows) => ResultValue::Array(
                rows.into_iter()
                    .map(|row| row.into_iter().map(Self::element).collect())
                    .collect(),
            ),
        }
    }
}

/// Why a formula was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionKind {
    /// The text is not a well-formed formula
    ParseError,
    /// Evaluation hit a resource limit
    Fatal,
}

/// A rejected formula: the kind of failure and its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<crate::Error> for Rejection {
    fn from(e: crate::Error) -> Self {
        let kind = match &e {
            crate::Error::Formula(f) if f.is_parse_error() => RejectionKind::ParseError,
            _ => RejectionKind::Fatal,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

/// Outcome of evaluating a formula against data
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// A successful result
    Value(ResultValue),
    /// The formula evaluated to a spreadsheet error value
    SpreadsheetError(CellError),
    /// The formula could not be evaluated at all
    Rejected(Rejection),
}

impl EvaluationOutcome {
    /// Whether the formula parsed and evaluated without a fatal failure
    pub fn is_valid(&self) -> bool {
        !matches!(self, EvaluationOutcome::Rejected(_))
    }
}

impl Serialize for EvaluationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EvaluationOutcome::Value(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("result", value)?;
                map.end()
            }
            EvaluationOutcome::SpreadsheetError(e) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("error", e.kind.as_str())?;
                map.serialize_entry("errorKind", &format!("{:?}", e.kind))?;
                if let Some(detail) = e.detail() {
                    map.serialize_entry("detail", detail)?;
                }
                map.end()
            }
            EvaluationOutcome::Rejected(rejection) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", &rejection.message)?;
                map.serialize_entry("errorKind", &rejection.kind)?;
                map.end()
            }
        }
    }
}

/// Result of a syntax check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The value the formula produced on the sample grid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ResultValue>,
}

impl From<EvaluationOutcome> for SyntaxCheck {
    fn from(outcome: EvaluationOutcome) -> Self {
        match outcome {
            EvaluationOutcome::Value(value) => Self {
                is_valid: true,
                error: None,
                value: Some(value),
            },
            EvaluationOutcome::SpreadsheetError(e) => Self {
                is_valid: true,
                error: None,
                value: Some(ResultValue::Error(e.kind.as_str().to_string())),
            },
            EvaluationOutcome::Rejected(rejection) => Self {
                is_valid: false,
                error: Some(rejection.message),
                value: None,
            },
        }
    }
}

/// Validation service with its configuration
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ServiceConfig,
}

impl Validator {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Check a formula by evaluating it against the sample grid
    pub fn validate_syntax(&self, formula: &str) -> SyntaxCheck {
        self.evaluate_on(formula, &self.config.sample.to_sheet()).into()
    }

    /// Evaluate a formula against caller data laid out as a table: headers
    /// in row 1 (when present), data rows below
    pub fn evaluate_with_sample(
        &self,
        formula: &str,
        headers: &[String],
        rows: &[Vec<CellValue>],
    ) -> EvaluationOutcome {
        let sheet = Sheet::from_table(headers.to_vec(), rows.to_vec());
        self.evaluate_on(formula, &sheet)
    }

    /// Evaluate a formula against a sheet
    pub fn evaluate_on(&self, formula: &str, sheet: &Sheet) -> EvaluationOutcome {
        let result = parse_formula(formula)
            .map_err(crate::Error::from)
            .and_then(|ast| self.evaluate_parsed(&ast, sheet));
        if let Err(e) = &result {
            debug!(formula, error = %e, "formula rejected");
        }
        outcome(result)
    }

    /// Evaluate an already-built expression against a sheet
    pub fn evaluate_expr(&self, expr: &FormulaExpr, sheet: &Sheet) -> EvaluationOutcome {
        outcome(self.evaluate_parsed(expr, sheet))
    }

    fn evaluate_parsed(&self, ast: &FormulaExpr, sheet: &Sheet) -> crate::Result<FormulaValue> {
        let (computed, _) = recalculate(sheet, &self.config.calculation)?;
        let ctx = EvaluationContext::with_options(&computed, self.config.calculation.evaluation);
        Ok(evaluate(ast, &ctx)?)
    }
}

fn outcome(result: crate::Result<FormulaValue>) -> EvaluationOutcome {
    match result {
        Ok(FormulaValue::Error(e)) => EvaluationOutcome::SpreadsheetError(e),
        Ok(value) => EvaluationOutcome::Value(ResultValue::from_value(value)),
        Err(e) => EvaluationOutcome::Rejected(e.into()),
    }
}

/// Check a formula against the default sample grid
pub fn validate_syntax(formula: &str) -> SyntaxCheck {
    Validator::default().validate_syntax(formula)
}

/// Evaluate a formula against caller data with the default configuration
pub fn evaluate_with_sample(
    formula: &str,
    headers: &[String],
    rows: &[Vec<CellValue>],
) -> EvaluationOutcome {
    Validator::default().evaluate_with_sample(formula, headers, rows)
}
