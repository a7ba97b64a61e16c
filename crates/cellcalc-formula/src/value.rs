//! Formula evaluation values and coercion rules

use cellcalc_core::{CellError, CellValue, ErrorKind};
use std::cmp::Ordering;

/// Result of evaluating a formula expression
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    #[default]
    Blank,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
    /// Rectangular, row-major array (range contents or an array constant)
    Array(Vec<Vec<FormulaValue>>),
}

impl FormulaValue {
    /// Create an error value without a detail
    pub fn error(kind: ErrorKind) -> Self {
        FormulaValue::Error(CellError::new(kind))
    }

    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        FormulaValue::Text(s.into())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, FormulaValue::Blank)
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn as_error(&self) -> Option<&CellError> {
        match self {
            FormulaValue::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Convert to number, if the arithmetic coercion rules allow it
    pub fn as_number(&self) -> Option<f64> {
        self.to_number().ok()
    }

    /// Arithmetic coercion: numbers, booleans (1/0), blank (0) and numeric
    /// text. Anything else is `#VALUE!`; an error value is passed through.
    pub fn to_number(&self) -> Result<f64, CellError> {
        match self {
            FormulaValue::Number(n) => Ok(*n),
            FormulaValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            FormulaValue::Blank => Ok(0.0),
            FormulaValue::Text(s) => parse_numeric_text(s).ok_or_else(|| {
                CellError::with_detail(
                    ErrorKind::InvalidValue,
                    format!("'{}' is not a number", s),
                )
            }),
            FormulaValue::Error(e) => Err(e.clone()),
            FormulaValue::Array(_) => Err(CellError::with_detail(
                ErrorKind::InvalidValue,
                "array used where a single value is expected",
            )),
        }
    }

    /// Logical coercion: booleans, numbers (non-zero is TRUE), blank (FALSE)
    /// and the text `TRUE`/`FALSE`
    pub fn to_bool(&self) -> Result<bool, CellError> {
        match self {
            FormulaValue::Boolean(b) => Ok(*b),
            FormulaValue::Number(n) => Ok(*n != 0.0),
            FormulaValue::Blank => Ok(false),
            FormulaValue::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("TRUE") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Ok(false)
                } else {
                    Err(CellError::with_detail(
                        ErrorKind::InvalidValue,
                        format!("'{}' is not a logical value", s),
                    ))
                }
            }
            FormulaValue::Error(e) => Err(e.clone()),
            FormulaValue::Array(_) => Err(CellError::with_detail(
                ErrorKind::InvalidValue,
                "array used where a single value is expected",
            )),
        }
    }

    /// Text coercion; errors and arrays do not convert
    pub fn to_text(&self) -> Result<String, CellError> {
        match self {
            FormulaValue::Error(e) => Err(e.clone()),
            FormulaValue::Array(_) => Err(CellError::with_detail(
                ErrorKind::InvalidValue,
                "array used where a single value is expected",
            )),
            other => Ok(other.as_text()),
        }
    }

    /// Render as text the way concatenation does
    pub fn as_text(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.kind.as_str().to_string(),
            FormulaValue::Blank => String::new(),
            FormulaValue::Array(_) => ErrorKind::InvalidValue.as_str().to_string(),
        }
    }

    /// Rows of an array, or a 1x1 grid holding a scalar
    pub fn into_rows(self) -> Vec<Vec<FormulaValue>> {
        match self {
            FormulaValue::Array(rows) => rows,
            scalar => vec![vec![scalar]],
        }
    }

    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Blank => "blank",
            FormulaValue::Number(_) => "number",
            FormulaValue::Text(_) => "text",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Error(_) => "error",
            FormulaValue::Array(_) => "array",
        }
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Blank => FormulaValue::Blank,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::Text(s) => FormulaValue::Text(s.as_str().to_string()),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        value.clone().into()
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Blank => CellValue::Blank,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::Text(s) => CellValue::text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::with_detail(
                ErrorKind::InvalidValue,
                "array result cannot be stored in a single cell",
            )),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::Text(s.to_string())
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::Text(s)
    }
}

impl From<ErrorKind> for FormulaValue {
    fn from(kind: ErrorKind) -> Self {
        FormulaValue::error(kind)
    }
}

impl From<CellError> for FormulaValue {
    fn from(e: CellError) -> Self {
        FormulaValue::Error(e)
    }
}

/// Parse text as a number: trimmed, optional sign, decimal or exponent
/// notation, optional trailing `%`. No thousands separators, no inf/NaN.
pub fn parse_numeric_text(s: &str) -> Option<f64> {
    let s = s.trim();
    let (digits, scale) = match s.strip_suffix('%') {
        Some(rest) => (rest.trim_end(), 0.01),
        None => (s, 1.0),
    };

    if digits.is_empty()
        || !digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        || !digits.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    digits
        .parse::<f64>()
        .ok()
        .map(|n| n * scale)
        .filter(|n| n.is_finite())
}

/// Format a number the way a spreadsheet shows it in text: at most 15
/// significant digits, integers without a decimal point, very large or very
/// small magnitudes in `1E+20` notation
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }

    // Round to 15 significant digits through scientific notation
    let rounded: f64 = format!("{:.14e}", n).parse().unwrap_or(n);

    if rounded.abs() >= 1e15 || rounded.abs() < 1e-9 {
        let sci = format!("{:e}", rounded);
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}E{}{:02}", mantissa, sign, exp.abs())
            }
            None => sci,
        };
    }

    format!("{}", rounded)
}

/// Rank of a value's type in mixed-type comparisons
fn type_rank(value: &FormulaValue) -> u8 {
    match value {
        FormulaValue::Number(_) => 0,
        FormulaValue::Text(_) => 1,
        FormulaValue::Boolean(_) => 2,
        _ => 3,
    }
}

/// Blank stands in for the zero value of the other side's type
fn blank_like(other: &FormulaValue) -> FormulaValue {
    match other {
        FormulaValue::Text(_) => FormulaValue::Text(String::new()),
        FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
        _ => FormulaValue::Number(0.0),
    }
}

/// Compare two scalar values with spreadsheet semantics
///
/// Numbers compare numerically, text case-insensitively and `FALSE < TRUE`.
/// Mixed types order as number < text < boolean.
pub fn compare_values(a: &FormulaValue, b: &FormulaValue) -> Ordering {
    match (a, b) {
        (FormulaValue::Blank, FormulaValue::Blank) => Ordering::Equal,
        (FormulaValue::Blank, other) => compare_values(&blank_like(other), other),
        (other, FormulaValue::Blank) => compare_values(other, &blank_like(other)),
        (FormulaValue::Number(x), FormulaValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FormulaValue::Text(x), FormulaValue::Text(y)) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        (FormulaValue::Boolean(x), FormulaValue::Boolean(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
