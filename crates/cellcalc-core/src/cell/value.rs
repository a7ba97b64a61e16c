//! Cell value types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Blank,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (all numbers stored as f64, including dates)
    Number(f64),

    /// Text value
    Text(SharedString),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        CellValue::Text(SharedString::new(s))
    }

    /// Create an error value without a detail message
    pub fn error(kind: ErrorKind) -> Self {
        CellValue::Error(CellError::new(kind))
    }

    /// Check if the cell is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the error if this is one
    pub fn as_error(&self) -> Option<&CellError> {
        match self {
            CellValue::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Blank => "blank",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Error(_) => "error",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s.as_str()),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl From<ErrorKind> for CellValue {
    fn from(kind: ErrorKind) -> Self {
        CellValue::error(kind)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Spreadsheet error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// #NULL! - Ranges do not intersect
    NullIntersection,
    /// #DIV/0! - Division by zero
    DivideByZero,
    /// #VALUE! - Wrong type of argument or operand
    InvalidValue,
    /// #REF! - Invalid cell reference
    InvalidReference,
    /// #NAME? - Unrecognized function or name
    NameNotFound,
    /// #NUM! - Invalid numeric value or domain error
    NumericError,
    /// #N/A - Value not available
    NotAvailable,
}

impl ErrorKind {
    /// All error kinds, in `ERROR.TYPE` order
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::NullIntersection,
        ErrorKind::DivideByZero,
        ErrorKind::InvalidValue,
        ErrorKind::InvalidReference,
        ErrorKind::NameNotFound,
        ErrorKind::NumericError,
        ErrorKind::NotAvailable,
    ];

    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NullIntersection => "#NULL!",
            ErrorKind::DivideByZero => "#DIV/0!",
            ErrorKind::InvalidValue => "#VALUE!",
            ErrorKind::InvalidReference => "#REF!",
            ErrorKind::NameNotFound => "#NAME?",
            ErrorKind::NumericError => "#NUM!",
            ErrorKind::NotAvailable => "#N/A",
        }
    }

    /// Parse an error string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }

    /// Numeric code as reported by `ERROR.TYPE`
    pub fn code(&self) -> u8 {
        match self {
            ErrorKind::NullIntersection => 1,
            ErrorKind::DivideByZero => 2,
            ErrorKind::InvalidValue => 3,
            ErrorKind::InvalidReference => 4,
            ErrorKind::NameNotFound => 5,
            ErrorKind::NumericError => 6,
            ErrorKind::NotAvailable => 7,
        }
    }

    /// Variant name, used in structured error reports
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NullIntersection => "NullIntersection",
            ErrorKind::DivideByZero => "DivideByZero",
            ErrorKind::InvalidValue => "InvalidValue",
            ErrorKind::InvalidReference => "InvalidReference",
            ErrorKind::NameNotFound => "NameNotFound",
            ErrorKind::NumericError => "NumericError",
            ErrorKind::NotAvailable => "NotAvailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error value with an optional diagnostic detail
///
/// The detail never takes part in comparisons: two errors are equal when
/// their kinds are equal.
#[derive(Debug, Clone)]
pub struct CellError {
    /// Error class
    pub kind: ErrorKind,
    /// Human-readable diagnostic, not part of the spreadsheet-visible value
    pub detail: Option<SharedString>,
}

impl CellError {
    /// Create an error without a detail message
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    /// Create an error carrying a diagnostic detail
    pub fn with_detail<S: AsRef<str>>(kind: ErrorKind, detail: S) -> Self {
        Self {
            kind,
            detail: Some(SharedString::new(detail)),
        }
    }

    /// Get the detail message, if any
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_ref().map(SharedString::as_str)
    }
}

impl PartialEq for CellError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for CellError {}

impl Hash for CellError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl From<ErrorKind> for CellError {
    fn from(kind: ErrorKind) -> Self {
        CellError::new(kind)
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())
    }
}

/// Shared immutable string
///
/// Sheets built from caller rows repeat the same text often; `Arc<str>`
/// keeps clones of cell values cheap during range materialization.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    //! Plain-JSON mapping: numbers, strings, booleans and null.
    //! Errors serialize as their code text.

    use super::{CellValue, SharedString};
    use serde::de::{self, Deserialize, Deserializer, Visitor};
    use serde::ser::{Serialize, Serializer};
    use std::fmt;

    impl Serialize for CellValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                CellValue::Blank => serializer.serialize_unit(),
                CellValue::Boolean(b) => serializer.serialize_bool(*b),
                CellValue::Number(n) => serializer.serialize_f64(*n),
                CellValue::Text(s) => serializer.serialize_str(s.as_str()),
                CellValue::Error(e) => serializer.serialize_str(e.kind.as_str()),
            }
        }
    }

    struct CellValueVisitor;

    impl<'de> Visitor<'de> for CellValueVisitor {
        type Value = CellValue;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, string, boolean or null")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
            Ok(CellValue::Boolean(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v as f64))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
            Ok(CellValue::Number(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
            Ok(CellValue::Text(SharedString::new(v)))
        }

        fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
            Ok(CellValue::Blank)
        }

        fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
            Ok(CellValue::Blank)
        }
    }

    impl<'de> Deserialize<'de> for CellValue {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<CellValue, D::Error> {
            deserializer.deserialize_any(CellValueVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(42), CellValue::Number(42.0));
        assert_eq!(CellValue::from(3.14), CellValue::Number(3.14));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));

        let s = CellValue::from("hello");
        assert_eq!(s.as_text(), Some("hello"));
    }

    #[test]
    fn test_blank_is_distinct() {
        assert_ne!(CellValue::Blank, CellValue::Number(0.0));
        assert_ne!(CellValue::Blank, CellValue::text(""));
        assert!(CellValue::default().is_blank());
    }

    #[test]
    fn test_cell_value_as_number() {
        assert_eq!(CellValue::Number(42.0).as_number(), Some(42.0));
        assert_eq!(CellValue::Boolean(true).as_number(), Some(1.0));
        assert_eq!(CellValue::Boolean(false).as_number(), Some(0.0));
        assert_eq!(CellValue::text("hello").as_number(), None);
        assert_eq!(CellValue::Blank.as_number(), None);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::DivideByZero.to_string(), "#DIV/0!");
        assert_eq!(ErrorKind::InvalidValue.to_string(), "#VALUE!");
        assert_eq!(ErrorKind::NotAvailable.to_string(), "#N/A");
        assert_eq!(CellError::new(ErrorKind::NameNotFound).to_string(), "#NAME?");
    }

    #[test]
    fn test_error_kind_parse() {
        assert_eq!(ErrorKind::parse("#DIV/0!"), Some(ErrorKind::DivideByZero));
        assert_eq!(ErrorKind::parse("#VALUE!"), Some(ErrorKind::InvalidValue));
        assert_eq!(ErrorKind::parse("#n/a"), Some(ErrorKind::NotAvailable));
        assert_eq!(ErrorKind::parse("invalid"), None);
    }

    #[test]
    fn test_error_detail_is_not_part_of_equality() {
        let plain = CellError::new(ErrorKind::NumericError);
        let detailed = CellError::with_detail(ErrorKind::NumericError, "did not converge");
        assert_eq!(plain, detailed);
        assert_eq!(detailed.detail(), Some("did not converge"));
        assert_ne!(plain, CellError::new(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_error_type_codes() {
        let codes: Vec<u8> = ErrorKind::ALL.iter().map(ErrorKind::code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
