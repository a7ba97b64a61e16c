//! Criteria matching for SUMIF, COUNTIF, AVERAGEIF and related functions
//!
//! A criterion can be:
//! - A number or boolean: exact match (e.g., 5)
//! - A text string: case-insensitive match with `*`, `?` wildcards (`~` escapes)
//! - A comparison expression: ">5", ">=10", "<100", "<=50", "<>0", "=5", ">b"
//! - An error literal such as "#N/A": matches that error
//! - Empty string or "=": matches blank cells; "<>" matches non-blank cells

use crate::value::{compare_values, parse_numeric_text, FormulaValue};
use cellcalc_core::ErrorKind;
use std::cmp::Ordering;

/// Criteria matcher for SUMIF/COUNTIF/AVERAGEIF and related functions
#[derive(Debug, Clone)]
pub struct CriteriaMatcher {
    criteria_type: CriteriaType,
}

#[derive(Debug, Clone)]
enum CriteriaType {
    /// Numeric comparison (operator, value)
    Number(ComparisonOp, f64),
    /// Boolean comparison
    Boolean(ComparisonOp, bool),
    /// Text equality with wildcards, possibly negated
    Pattern { pattern: Vec<PatternToken>, negate: bool },
    /// Ordered text comparison (<, <=, >, >=)
    TextOrder(ComparisonOp, String),
    /// Match a specific error
    Error(ErrorKind),
    /// Match blank values (and empty text)
    Blank,
    /// Match anything that is not blank
    NotBlank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl ComparisonOp {
    fn test(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

impl CriteriaMatcher {
    /// Create a criteria matcher from a criterion value
    pub fn new(criteria: &FormulaValue) -> Self {
        let criteria_type = match criteria {
            FormulaValue::Number(n) => CriteriaType::Number(ComparisonOp::Equal, *n),
            FormulaValue::Boolean(b) => CriteriaType::Boolean(ComparisonOp::Equal, *b),
            FormulaValue::Text(s) => Self::parse_text_criteria(s),
            FormulaValue::Error(e) => CriteriaType::Error(e.kind),
            FormulaValue::Blank | FormulaValue::Array(_) => CriteriaType::Blank,
        };

        Self { criteria_type }
    }

    fn parse_text_criteria(s: &str) -> CriteriaType {
        let (op, rest) = split_operator(s);

        if rest.is_empty() {
            return match op {
                Some(ComparisonOp::NotEqual) => CriteriaType::NotBlank,
                _ => CriteriaType::Blank,
            };
        }

        let op_or_equal = op.unwrap_or(ComparisonOp::Equal);

        if let Some(n) = parse_numeric_text(rest) {
            return CriteriaType::Number(op_or_equal, n);
        }
        if rest.eq_ignore_ascii_case("TRUE") {
            return CriteriaType::Boolean(op_or_equal, true);
        }
        if rest.eq_ignore_ascii_case("FALSE") {
            return CriteriaType::Boolean(op_or_equal, false);
        }
        if let Some(kind) = ErrorKind::parse(rest.trim()) {
            if op_or_equal == ComparisonOp::Equal {
                return CriteriaType::Error(kind);
            }
        }

        match op_or_equal {
            ComparisonOp::Equal => CriteriaType::Pattern {
                pattern: compile_pattern(rest),
                negate: false,
            },
            ComparisonOp::NotEqual => CriteriaType::Pattern {
                pattern: compile_pattern(rest),
                negate: true,
            },
            op => CriteriaType::TextOrder(op, rest.to_string()),
        }
    }

    /// Check if a value matches the criteria
    pub fn matches(&self, value: &FormulaValue) -> bool {
        match &self.criteria_type {
            CriteriaType::Number(op, criteria_num) => match value {
                FormulaValue::Number(n) => op.test(
                    n.partial_cmp(criteria_num).unwrap_or(Ordering::Equal),
                ),
                // Text that reads as the number matches an equality criterion
                FormulaValue::Text(s) if *op == ComparisonOp::Equal => {
                    parse_numeric_text(s).map_or(false, |n| n == *criteria_num)
                }
                _ => *op == ComparisonOp::NotEqual,
            },

            CriteriaType::Boolean(op, criteria_bool) => match value {
                FormulaValue::Boolean(b) => op.test(b.cmp(criteria_bool)),
                _ => *op == ComparisonOp::NotEqual,
            },

            CriteriaType::Pattern { pattern, negate } => {
                let is_match = match value {
                    FormulaValue::Text(s) => matches_pattern(pattern, s),
                    FormulaValue::Error(_) | FormulaValue::Array(_) => false,
                    other => matches_pattern(pattern, &other.as_text()),
                };
                is_match != *negate
            }

            CriteriaType::TextOrder(op, text) => match value {
                FormulaValue::Text(s) => op.test(compare_values(
                    &FormulaValue::Text(s.clone()),
                    &FormulaValue::Text(text.clone()),
                )),
                _ => false,
            },

            CriteriaType::Error(kind) => {
                matches!(value, FormulaValue::Error(e) if e.kind == *kind)
            }

            CriteriaType::Blank => match value {
                FormulaValue::Blank => true,
                FormulaValue::Text(s) => s.is_empty(),
                _ => false,
            },

            CriteriaType::NotBlank => !matches!(value, FormulaValue::Blank),
        }
    }
}

fn split_operator(s: &str) -> (Option<ComparisonOp>, &str) {
    for (prefix, op) in [
        (">=", ComparisonOp::GreaterEqual),
        ("<=", ComparisonOp::LessEqual),
        ("<>", ComparisonOp::NotEqual),
        (">", ComparisonOp::GreaterThan),
        ("<", ComparisonOp::LessThan),
        ("=", ComparisonOp::Equal),
    ] {
        if let Some(rest) = s.strip_prefix(prefix) {
            return (Some(op), rest);
        }
    }
    (None, s)
}

/// One element of a compiled wildcard pattern
#[derive(Debug, Clone, PartialEq)]
enum PatternToken {
    /// `*`: any run of characters
    Any,
    /// `?`: exactly one character
    One,
    /// Literal character, lowercased
    Char(char),
}

fn compile_pattern(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => tokens.push(PatternToken::Any),
            '?' => tokens.push(PatternToken::One),
            '~' => match chars.next() {
                Some(escaped) => tokens.extend(escaped.to_lowercase().map(PatternToken::Char)),
                None => tokens.push(PatternToken::Char('~')),
            },
            c => tokens.extend(c.to_lowercase().map(PatternToken::Char)),
        }
    }
    tokens
}

/// Backtracking match of a compiled pattern against the whole text
fn matches_pattern(pattern: &[PatternToken], text: &str) -> bool {
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    matches_chars(pattern, &text)
}

/// Match against text that is already lowercased
fn matches_chars(pattern: &[PatternToken], text: &[char]) -> bool {
    let mut pi = 0; // pattern index
    let mut ti = 0; // text index
    let mut star_pi = None; // position of last * in pattern
    let mut star_ti = 0; // position in text when we matched last *

    while ti < text.len() {
        match pattern.get(pi) {
            Some(PatternToken::One) => {
                pi += 1;
                ti += 1;
            }
            Some(PatternToken::Char(c)) if *c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            // A trailing * takes whatever is left
            Some(PatternToken::Any) if pi + 1 == pattern.len() => return true,
            Some(PatternToken::Any) => {
                star_pi = Some(pi);
                star_ti = ti;
                pi += 1; // Try matching * with empty string first
            }
            _ => match star_pi {
                Some(sp) => {
                    pi = sp + 1;
                    star_ti += 1;
                    ti = star_ti;
                }
                None => return false,
            },
        }
    }

    // Remaining pattern must all be *
    pattern[pi.min(pattern.len())..]
        .iter()
        .all(|t| *t == PatternToken::Any)
}

/// Case-insensitive whole-text wildcard match (`*`, `?`, `~` escapes)
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    matches_pattern(&compile_pattern(pattern), text)
}

/// Whether a lookup value uses wildcard syntax
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '~'])
}

/// Find the first character index at or after `start` where the pattern
/// matches a prefix of the remaining text
pub fn wildcard_find(pattern: &str, text: &str, start: usize) -> Option<usize> {
    let mut tokens = compile_pattern(pattern);
    tokens.push(PatternToken::Any);

    // Lowercased once; `offsets[i]` is where character i starts, since
    // lowercasing can expand a character
    let mut lowered = Vec::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for c in text.chars() {
        offsets.push(lowered.len());
        lowered.extend(c.to_lowercase());
    }
    offsets.push(lowered.len());

    (start..offsets.len()).find(|&i| matches_chars(&tokens, &lowered[offsets[i]..]))
}
