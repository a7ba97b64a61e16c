//! Formula evaluator
//!
//! Evaluation is a pure function of the expression and the sheet. Spreadsheet
//! failures come back as [`FormulaValue::Error`]; only resource limits end
//! evaluation with an `Err`.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{ArgKind, FunctionImpl, FunctionRegistry};
use crate::value::{compare_values, FormulaValue};
use cellcalc_core::{CellAddress, CellError, CellRange, CellValue, ErrorKind, Sheet};
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

/// Limits applied while evaluating a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct EvaluationOptions {
    /// Maximum number of nested function calls
    pub max_call_depth: usize,
    /// Maximum number of nested expression nodes
    pub max_expression_depth: usize,
    /// Largest range materialized before clipping to the populated area
    pub max_range_cells: u64,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_expression_depth: 1024,
            max_range_cells: 1_000_000,
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    sheet: &'a Sheet,
    options: EvaluationOptions,
    registry: &'static FunctionRegistry,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context with default limits
    pub fn new(sheet: &'a Sheet) -> Self {
        Self::with_options(sheet, EvaluationOptions::default())
    }

    /// Create a context with explicit limits
    pub fn with_options(sheet: &'a Sheet, options: EvaluationOptions) -> Self {
        Self {
            sheet,
            options,
            registry: FunctionRegistry::global(),
        }
    }

    pub fn sheet(&self) -> &'a Sheet {
        self.sheet
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Get a cell value from the sheet
    pub fn get_cell_value(&self, addr: &CellAddress) -> FormulaValue {
        if !addr.is_valid() {
            return FormulaValue::Error(CellError::with_detail(
                ErrorKind::InvalidReference,
                format!("{} is outside the sheet", addr),
            ));
        }
        self.sheet.get(addr).into()
    }

    /// Get a range of cell values as a row-major array
    ///
    /// Ranges larger than `max_range_cells` are clipped to the populated part
    /// of the sheet; if that is still too large the result is `#VALUE!`.
    pub fn get_range_values(&self, range: &CellRange) -> FormulaValue {
        if !range.start.is_valid() || !range.end.is_valid() {
            return FormulaValue::Error(CellError::with_detail(
                ErrorKind::InvalidReference,
                format!("{} is outside the sheet", range),
            ));
        }

        let limit = self.options.max_range_cells;
        let (mut end_row, mut end_col) = (range.end.row, range.end.col);

        if range.cell_count() > limit {
            let rows = self.sheet.row_count();
            let cols = self.sheet.col_count();
            if rows <= range.start.row || cols <= range.start.col {
                return FormulaValue::Array(Vec::new());
            }
            end_row = end_row.min(rows - 1);
            end_col = end_col.min(cols - 1);

            let clipped =
                (end_row - range.start.row + 1) as u64 * (end_col - range.start.col + 1) as u64;
            if clipped > limit {
                return FormulaValue::Error(CellError::with_detail(
                    ErrorKind::InvalidValue,
                    format!("range {} has more than {} cells", range, limit),
                ));
            }
        }

        let rows = (range.start.row..=end_row)
            .map(|row| {
                (range.start.col..=end_col)
                    .map(|col| self.sheet.value_at(row, col).into())
                    .collect()
            })
            .collect();
        FormulaValue::Array(rows)
    }
}

/// Recursion counters, passed by value down the tree
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Depth {
    nodes: usize,
    calls: usize,
}

impl Depth {
    fn node(self, ctx: &EvaluationContext) -> FormulaResult<Self> {
        let nodes = self.nodes + 1;
        if nodes > ctx.options.max_expression_depth {
            warn!(limit = ctx.options.max_expression_depth, "expression depth exceeded");
            return Err(FormulaError::DepthExceeded {
                what: "expression",
                limit: ctx.options.max_expression_depth,
            });
        }
        Ok(Self { nodes, ..self })
    }

    fn call(self, ctx: &EvaluationContext) -> FormulaResult<Self> {
        let calls = self.calls + 1;
        if calls > ctx.options.max_call_depth {
            warn!(limit = ctx.options.max_call_depth, "function call depth exceeded");
            return Err(FormulaError::DepthExceeded {
                what: "function call",
                limit: ctx.options.max_call_depth,
            });
        }
        Ok(Self { calls, ..self })
    }
}

/// Unevaluated arguments handed to lazy functions (IF, IFERROR, ISERROR, ...)
pub struct LazyArgs<'a> {
    ctx: &'a EvaluationContext<'a>,
    exprs: &'a [FormulaExpr],
    depth: Depth,
}

impl<'a> LazyArgs<'a> {
    /// Number of arguments supplied
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// The argument expression itself
    pub fn expr(&self, index: usize) -> Option<&'a FormulaExpr> {
        self.exprs.get(index)
    }

    /// Evaluate one argument in scalar context
    ///
    /// A missing argument evaluates to blank.
    pub fn value(&self, index: usize) -> FormulaResult<FormulaValue> {
        match self.exprs.get(index) {
            Some(expr) => eval_expr(expr, self.ctx, self.depth),
            None => Ok(FormulaValue::Blank),
        }
    }

    /// Evaluate an argument that becomes the function's result: a range
    /// materializes as an array, anything else evaluates in scalar context
    pub fn result(&self, index: usize) -> FormulaResult<FormulaValue> {
        match self.exprs.get(index) {
            Some(FormulaExpr::RangeRef(_)) => self.array(index),
            Some(expr) => eval_expr(expr, self.ctx, self.depth),
            None => Ok(FormulaValue::Blank),
        }
    }

    /// Evaluate one argument the way array-kind parameters are evaluated
    pub fn array(&self, index: usize) -> FormulaResult<FormulaValue> {
        match self.exprs.get(index) {
            Some(expr) => eval_array_arg(expr, self.ctx, self.depth),
            None => Ok(FormulaValue::Blank),
        }
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    debug!(formula = %expr, "evaluating formula");
    eval_expr(expr, ctx, Depth::default())
}

/// Evaluate against a sheet with default limits and convert to a cell value
pub fn evaluate_to_cell(expr: &FormulaExpr, sheet: &Sheet) -> FormulaResult<CellValue> {
    let ctx = EvaluationContext::new(sheet);
    evaluate(expr, &ctx).map(CellValue::from)
}

fn eval_expr(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: Depth,
) -> FormulaResult<FormulaValue> {
    let depth = depth.node(ctx)?;

    match expr {
        // === Literals ===
        FormulaExpr::Literal(value) => Ok(value.into()),

        // === References ===
        FormulaExpr::Reference(addr) => Ok(ctx.get_cell_value(addr)),

        FormulaExpr::RangeRef(range) => Ok(FormulaValue::Error(CellError::with_detail(
            ErrorKind::InvalidValue,
            format!("range {} used where a single value is expected", range),
        ))),

        FormulaExpr::Name(name) => Ok(FormulaValue::Error(CellError::with_detail(
            ErrorKind::NameNotFound,
            format!("unknown name '{}'", name),
        ))),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => {
            evaluate_binary_op(*op, left, right, ctx, depth)
        }

        FormulaExpr::UnaryOp { op, operand } => {
            let value = eval_expr(operand, ctx, depth)?;
            if value.is_error() {
                return Ok(value);
            }
            Ok(apply_unary(*op, value).unwrap_or_else(FormulaValue::Error))
        }

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx, depth),

        // === Arrays ===
        FormulaExpr::Array(rows) => {
            let mut result_rows = Vec::with_capacity(rows.len());
            for row in rows {
                let mut result_row = Vec::with_capacity(row.len());
                for element in row {
                    let value = match eval_expr(element, ctx, depth)? {
                        FormulaValue::Array(_) => FormulaValue::error(ErrorKind::InvalidValue),
                        value => value,
                    };
                    result_row.push(value);
                }
                result_rows.push(result_row);
            }
            Ok(FormulaValue::Array(result_rows))
        }
    }
}

/// Evaluate an argument for an array-kind parameter: ranges materialize,
/// single references become 1x1 arrays, anything else evaluates normally
fn eval_array_arg(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: Depth,
) -> FormulaResult<FormulaValue> {
    match expr {
        FormulaExpr::RangeRef(range) => {
            depth.node(ctx)?;
            Ok(ctx.get_range_values(range))
        }
        FormulaExpr::Reference(addr) => {
            depth.node(ctx)?;
            match ctx.get_cell_value(addr) {
                FormulaValue::Error(e) if e.kind == ErrorKind::InvalidReference => {
                    Ok(FormulaValue::Error(e))
                }
                value => Ok(FormulaValue::Array(vec![vec![value]])),
            }
        }
        _ => eval_expr(expr, ctx, depth),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
    depth: Depth,
) -> FormulaResult<FormulaValue> {
    // First error wins, so the right side is not evaluated after a left error
    let left_val = eval_expr(left, ctx, depth)?;
    if left_val.is_error() {
        return Ok(left_val);
    }

    let right_val = eval_expr(right, ctx, depth)?;
    if right_val.is_error() {
        return Ok(right_val);
    }

    Ok(apply_binary(op, &left_val, &right_val).unwrap_or_else(FormulaValue::Error))
}

/// Apply a binary operator to two non-error operands
pub(crate) fn apply_binary(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
) -> Result<FormulaValue, CellError> {
    match op {
        BinaryOperator::Add => arithmetic(left, right, |a, b| Ok(a + b)),
        BinaryOperator::Subtract => arithmetic(left, right, |a, b| Ok(a - b)),
        BinaryOperator::Multiply => arithmetic(left, right, |a, b| Ok(a * b)),
        BinaryOperator::Divide => arithmetic(left, right, |a, b| {
            if b == 0.0 {
                Err(CellError::new(ErrorKind::DivideByZero))
            } else {
                Ok(a / b)
            }
        }),
        BinaryOperator::Power => arithmetic(left, right, power),
        BinaryOperator::Concat => {
            let mut text = left.to_text()?;
            text.push_str(&right.to_text()?);
            Ok(FormulaValue::Text(text))
        }
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => {
            if matches!(left, FormulaValue::Array(_)) || matches!(right, FormulaValue::Array(_)) {
                return Err(CellError::with_detail(
                    ErrorKind::InvalidValue,
                    "cannot compare an array",
                ));
            }
            let ordering = compare_values(left, right);
            let result = match op {
                BinaryOperator::Equal => ordering == Ordering::Equal,
                BinaryOperator::NotEqual => ordering != Ordering::Equal,
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(FormulaValue::Boolean(result))
        }
    }
}

fn arithmetic(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl Fn(f64, f64) -> Result<f64, CellError>,
) -> Result<FormulaValue, CellError> {
    let a = left.to_number()?;
    let b = right.to_number()?;
    let result = f(a, b)?;
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Err(CellError::with_detail(
            ErrorKind::NumericError,
            "result is not a finite number",
        ))
    }
}

/// `base ^ exponent` with the spreadsheet domain rules
pub(crate) fn power(base: f64, exponent: f64) -> Result<f64, CellError> {
    if base == 0.0 && exponent == 0.0 {
        return Err(CellError::with_detail(ErrorKind::NumericError, "0^0 is undefined"));
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(CellError::new(ErrorKind::DivideByZero));
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(CellError::with_detail(
            ErrorKind::NumericError,
            "negative base with a fractional exponent",
        ));
    }
    Ok(base.powf(exponent))
}

fn apply_unary(op: UnaryOperator, value: FormulaValue) -> Result<FormulaValue, CellError> {
    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-value.to_number()?)),
        UnaryOperator::Percent => Ok(FormulaValue::Number(value.to_number()? / 100.0)),
        UnaryOperator::Plus => match value {
            FormulaValue::Array(_) => Err(CellError::new(ErrorKind::InvalidValue)),
            value => Ok(value),
        },
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
    depth: Depth,
) -> FormulaResult<FormulaValue> {
    let def = match ctx.registry.get(name) {
        Some(def) => def,
        None => {
            return Ok(FormulaValue::Error(CellError::with_detail(
                ErrorKind::NameNotFound,
                format!("unknown function '{}'", name),
            )))
        }
    };

    if let Some(detail) = def.arity_error(args.len()) {
        return Ok(FormulaValue::Error(CellError::with_detail(
            ErrorKind::InvalidValue,
            detail,
        )));
    }

    let depth = depth.call(ctx)?;
    trace!(function = def.name, args = args.len(), "dispatching function");

    let result = match def.implementation {
        FunctionImpl::Lazy(f) => f(&LazyArgs {
            ctx,
            exprs: args,
            depth,
        })?,
        FunctionImpl::Eager(f) => {
            let mut values = Vec::with_capacity(args.len());
            for (i, arg) in args.iter().enumerate() {
                let value = match def.arg_kind(i) {
                    ArgKind::Array => eval_array_arg(arg, ctx, depth)?,
                    ArgKind::Scalar | ArgKind::Lazy => match eval_expr(arg, ctx, depth)? {
                        FormulaValue::Array(_) => FormulaValue::Error(CellError::with_detail(
                            ErrorKind::InvalidValue,
                            format!("argument {} of {} must be a single value", i + 1, def.name),
                        )),
                        value => value,
                    },
                };
                // First error wins; later arguments are not evaluated
                if value.is_error() {
                    return Ok(value);
                }
                values.push(value);
            }
            f(&values).unwrap_or_else(FormulaValue::Error)
        }
    };

    Ok(sanitize(result))
}

/// Non-finite numbers never escape a function
fn sanitize(value: FormulaValue) -> FormulaValue {
    match value {
        FormulaValue::Number(n) if !n.is_finite() => FormulaValue::Error(CellError::with_detail(
            ErrorKind::NumericError,
            "result is not a finite number",
        )),
        FormulaValue::Array(rows) => FormulaValue::Array(
            rows.into_iter()
                .map(|row| row.into_iter().map(sanitize).collect())
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn sheet() -> Sheet {
        Sheet::new(
            vec![],
            vec![
                vec![CellValue::from(1), CellValue::from("a"), CellValue::from(true)],
                vec![CellValue::from(2), CellValue::from(" 3 "), CellValue::Blank],
                vec![
                    CellValue::from(3),
                    CellValue::error(ErrorKind::NotAvailable),
                    CellValue::from(0),
                ],
            ],
        )
    }

    fn eval(formula: &str) -> FormulaValue {
        let sheet = sheet();
        let ctx = EvaluationContext::new(&sheet);
        evaluate(&parse_formula(formula).unwrap(), &ctx).unwrap()
    }

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42"), FormulaValue::Number(42.0));
        assert_eq!(eval("=\"Hello\""), FormulaValue::text("Hello"));
        assert_eq!(eval("=TRUE"), FormulaValue::Boolean(true));
        assert_eq!(eval("=#REF!"), err(ErrorKind::InvalidReference));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2"), FormulaValue::Number(3.0));
        assert_eq!(eval("=10-3"), FormulaValue::Number(7.0));
        assert_eq!(eval("=4*5"), FormulaValue::Number(20.0));
        assert_eq!(eval("=20/4"), FormulaValue::Number(5.0));
        assert_eq!(eval("=2^10"), FormulaValue::Number(1024.0));
        assert_eq!(eval("=50%"), FormulaValue::Number(0.5));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("=1+2*3"), FormulaValue::Number(7.0));
        assert_eq!(eval("=-2^2"), FormulaValue::Number(-4.0));
        assert_eq!(eval("=2^3^2"), FormulaValue::Number(512.0));
        assert_eq!(eval("=1+2&3"), FormulaValue::Number(24.0));
        assert_eq!(eval("=2^-1"), FormulaValue::Number(0.5));
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(eval("=1/0"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("=0^0"), err(ErrorKind::NumericError));
        assert_eq!(eval("=(-8)^0.5"), err(ErrorKind::NumericError));
        assert_eq!(eval("=1E300*1E300"), err(ErrorKind::NumericError));
        assert_eq!(eval("=\"abc\"+1"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_coercion_from_cells() {
        // A2 = 2, B2 = " 3 " (numeric text), C1 = TRUE, C2 = blank
        assert_eq!(eval("=A2+B2"), FormulaValue::Number(5.0));
        assert_eq!(eval("=C1+1"), FormulaValue::Number(2.0));
        assert_eq!(eval("=C2+1"), FormulaValue::Number(1.0));
        assert_eq!(eval("=B1*2"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=Z99"), FormulaValue::Blank);
    }

    #[test]
    fn test_first_error_wins() {
        assert_eq!(eval("=1/0+B3"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("=B3+1/0"), err(ErrorKind::NotAvailable));
        assert_eq!(eval("=-B3"), err(ErrorKind::NotAvailable));
        assert_eq!(eval("=SUM(1/0,B3)"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_range_in_scalar_context() {
        assert_eq!(eval("=A1:A3"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=A1:A3+1"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=SUM(A1:A3)"), FormulaValue::Number(6.0));
    }

    #[test]
    fn test_concat_and_compare() {
        assert_eq!(eval("=\"x\"&1.5&TRUE&C2"), FormulaValue::text("x1.5TRUE"));
        assert_eq!(eval("=\"abc\"=\"ABC\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=2<\"1\""), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"z\"<FALSE"), FormulaValue::Boolean(true));
        assert_eq!(eval("=C2=0"), FormulaValue::Boolean(true));
        assert_eq!(eval("=C2=\"\""), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_unknown_function_and_arity() {
        assert_eq!(eval("=NOSUCH(1)"), err(ErrorKind::NameNotFound));
        assert_eq!(eval("=ABS(1,2)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=ABS()"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=revenue"), err(ErrorKind::NameNotFound));
    }

    #[test]
    fn test_lazy_branches_are_not_evaluated() {
        assert_eq!(eval("=IF(TRUE,1,1/0)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=IF(FALSE,NOSUCH(),2)"), FormulaValue::Number(2.0));
        assert_eq!(eval("=IFERROR(1/0,7)"), FormulaValue::Number(7.0));
    }

    #[test]
    fn test_array_constant() {
        assert_eq!(
            eval("={1,2;3,4}"),
            FormulaValue::Array(vec![
                vec![FormulaValue::Number(1.0), FormulaValue::Number(2.0)],
                vec![FormulaValue::Number(3.0), FormulaValue::Number(4.0)],
            ])
        );
        assert_eq!(eval("=SUM({1,2;3,4})"), FormulaValue::Number(10.0));
    }

    #[test]
    fn test_call_depth_is_fatal() {
        let sheet = sheet();
        let options = EvaluationOptions {
            max_call_depth: 3,
            ..Default::default()
        };
        let ctx = EvaluationContext::with_options(&sheet, options);

        let ok = parse_formula("=ABS(ABS(ABS(1)))").unwrap();
        assert_eq!(evaluate(&ok, &ctx).unwrap(), FormulaValue::Number(1.0));

        let deep = parse_formula("=ABS(ABS(ABS(ABS(1))))").unwrap();
        assert_eq!(
            evaluate(&deep, &ctx),
            Err(FormulaError::DepthExceeded {
                what: "function call",
                limit: 3
            })
        );
    }

    #[test]
    fn test_expression_depth_is_fatal() {
        let sheet = sheet();
        let options = EvaluationOptions {
            max_expression_depth: 10,
            ..Default::default()
        };
        let ctx = EvaluationContext::with_options(&sheet, options);
        let chain = parse_formula(&format!("={}", vec!["1"; 20].join("+"))).unwrap();
        assert!(matches!(
            evaluate(&chain, &ctx),
            Err(FormulaError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn test_large_range_is_clipped() {
        let sheet = sheet();
        let ctx = EvaluationContext::new(&sheet);
        let expr = parse_formula("=SUM(A1:XFD1048576)").unwrap();
        assert_eq!(evaluate(&expr, &ctx).unwrap(), err(ErrorKind::NotAvailable));

        let expr = parse_formula("=COUNT(A1:XFD1048576)").unwrap();
        assert_eq!(evaluate(&expr, &ctx).unwrap(), FormulaValue::Number(4.0));
    }

    #[test]
    fn test_evaluate_to_cell() {
        let sheet = sheet();
        let expr = parse_formula("=A1&\"-\"&A2").unwrap();
        assert_eq!(evaluate_to_cell(&expr, &sheet).unwrap(), CellValue::from("1-2"));
    }
}
