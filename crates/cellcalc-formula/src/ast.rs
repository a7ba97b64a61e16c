//! Formula Abstract Syntax Tree types

use cellcalc_core::{CellAddress, CellRange, CellValue};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Number, text, boolean or error constant
    Literal(CellValue),

    // === References ===
    /// Single cell reference
    Reference(CellAddress),
    /// Rectangular range reference (normalized)
    RangeRef(CellRange),
    /// Bare identifier that is not a function call
    Name(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        /// Upper-cased function name
        name: String,
        args: Vec<FormulaExpr>,
    },

    // === Array constant ===
    Array(Vec<Vec<FormulaExpr>>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Text
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Operator text as written in a formula
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Whether this is one of the six comparison operators
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Prefix `-`
    Negate,
    /// Prefix `+`
    Plus,
    /// Postfix `%`
    Percent,
}

impl FormulaExpr {
    /// Numeric literal
    pub fn number(n: f64) -> Self {
        FormulaExpr::Literal(CellValue::Number(n))
    }

    /// Text literal
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        FormulaExpr::Literal(CellValue::text(s))
    }

    /// Boolean literal
    pub fn boolean(b: bool) -> Self {
        FormulaExpr::Literal(CellValue::Boolean(b))
    }

    /// Function call with an upper-cased name
    pub fn call<S: AsRef<str>>(name: S, args: Vec<FormulaExpr>) -> Self {
        FormulaExpr::Function {
            name: name.as_ref().to_ascii_uppercase(),
            args,
        }
    }

    /// Canonical formula text, including the leading `=`
    ///
    /// Every operator application is parenthesized, so the text parses back
    /// to an expression that evaluates identically regardless of precedence.
    pub fn to_formula_string(&self) -> String {
        format!("={}", self)
    }

    /// All cell and range references in the expression, in source order
    pub fn references(&self) -> Vec<CellRange> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<CellRange>) {
        match self {
            FormulaExpr::Reference(addr) => refs.push(CellRange::single(*addr)),
            FormulaExpr::RangeRef(range) => refs.push(*range),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_references(refs),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            FormulaExpr::Array(rows) => {
                for expr in rows.iter().flatten() {
                    expr.collect_references(refs);
                }
            }
            FormulaExpr::Literal(_) | FormulaExpr::Name(_) => {}
        }
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Literal(value) => write_literal(f, value),
            FormulaExpr::Reference(addr) => write!(f, "{}", addr),
            // Always written with a colon so a one-cell range stays a range
            FormulaExpr::RangeRef(range) => write!(f, "{}:{}", range.start, range.end),
            FormulaExpr::Name(name) => write!(f, "{}", name),
            FormulaExpr::BinaryOp { op, left, right } => {
                write!(f, "({}{}{})", left, op.symbol(), right)
            }
            FormulaExpr::UnaryOp { op, operand } => match op {
                UnaryOperator::Negate => write!(f, "-{}", operand),
                UnaryOperator::Plus => write!(f, "+{}", operand),
                UnaryOperator::Percent => match operand.as_ref() {
                    FormulaExpr::UnaryOp { .. } => write!(f, "({})%", operand),
                    _ => write!(f, "{}%", operand),
                },
            },
            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            FormulaExpr::Array(rows) => {
                write!(f, "{{")?;
                for (r, row) in rows.iter().enumerate() {
                    if r > 0 {
                        write!(f, ";")?;
                    }
                    for (c, expr) in row.iter().enumerate() {
                        if c > 0 {
                            write!(f, ",")?;
                        }
                        // Array constants take signed numbers without parentheses
                        match expr {
                            FormulaExpr::Literal(CellValue::Number(n)) => write!(f, "{}", n)?,
                            _ => write!(f, "{}", expr)?,
                        }
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &CellValue) -> fmt::Result {
    match value {
        // No literal syntax for blank; an omitted argument reads as blank
        CellValue::Blank => Ok(()),
        CellValue::Number(n) if *n < 0.0 => write!(f, "({})", n),
        CellValue::Number(n) => write!(f, "{}", n),
        CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        CellValue::Text(s) => write!(f, "\"{}\"", s.as_str().replace('"', "\"\"")),
        CellValue::Error(e) => write!(f, "{}", e.kind.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_literals() {
        assert_eq!(FormulaExpr::number(42.0).to_string(), "42");
        assert_eq!(FormulaExpr::number(0.5).to_string(), "0.5");
        assert_eq!(FormulaExpr::number(-3.0).to_string(), "(-3)");
        assert_eq!(FormulaExpr::text("say \"hi\"").to_string(), "\"say \"\"hi\"\"\"");
        assert_eq!(FormulaExpr::boolean(false).to_string(), "FALSE");
        assert_eq!(
            FormulaExpr::Literal(CellValue::error(ErrorKind::NotAvailable)).to_string(),
            "#N/A"
        );
    }

    #[test]
    fn test_display_parenthesizes_operators() {
        let expr = FormulaExpr::BinaryOp {
            op: BinaryOperator::Add,
            left: Box::new(FormulaExpr::number(1.0)),
            right: Box::new(FormulaExpr::BinaryOp {
                op: BinaryOperator::Multiply,
                left: Box::new(FormulaExpr::number(2.0)),
                right: Box::new(FormulaExpr::number(3.0)),
            }),
        };
        assert_eq!(expr.to_formula_string(), "=(1+(2*3))");
    }

    #[test]
    fn test_display_single_cell_range_keeps_colon() {
        let range = CellRange::parse("B2").unwrap();
        assert_eq!(FormulaExpr::RangeRef(range).to_string(), "B2:B2");
    }

    #[test]
    fn test_display_call_and_array() {
        let expr = FormulaExpr::call(
            "sum",
            vec![
                FormulaExpr::RangeRef(CellRange::parse("A1:A3").unwrap()),
                FormulaExpr::Array(vec![
                    vec![FormulaExpr::number(1.0), FormulaExpr::number(2.0)],
                    vec![FormulaExpr::number(3.0), FormulaExpr::number(4.0)],
                ]),
            ],
        );
        assert_eq!(expr.to_string(), "SUM(A1:A3,{1,2;3,4})");
    }

    #[test]
    fn test_references_in_source_order() {
        let expr = FormulaExpr::call(
            "IF",
            vec![
                FormulaExpr::Reference(CellAddress::new(0, 0)),
                FormulaExpr::RangeRef(CellRange::parse("B1:B4").unwrap()),
                FormulaExpr::number(0.0),
            ],
        );
        let refs: Vec<String> = expr.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["A1", "B1:B4"]);
    }
}
