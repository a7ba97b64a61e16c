//! Built-in spreadsheet functions
//!
//! Every function is described by a [`FunctionDef`]: its arity, the kind of
//! each parameter and a description that doubles as its published contract.
//! The evaluator checks arity and evaluates arguments according to their
//! [`ArgKind`] before an implementation ever runs, so implementations only
//! see argument lists of a legal length with no top-level error values.

pub mod criteria;
pub mod date;
pub mod distribution;
pub mod financial;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod statistical;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::LazyArgs;
use crate::value::FormulaValue;
use cellcalc_core::{CellError, ErrorKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Result of an eager function; an `Err` becomes the error value
pub type FnResult = Result<FormulaValue, CellError>;

/// How an argument is evaluated before the function sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Single value; ranges and arrays are `#VALUE!`
    Scalar,
    /// Range-aware: ranges and references become arrays
    Array,
    /// Passed unevaluated to a lazy implementation
    Lazy,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::Scalar => "scalar",
            ArgKind::Array => "array",
            ArgKind::Lazy => "lazy",
        }
    }
}

/// A named parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ArgKind,
}

impl Param {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Scalar,
        }
    }

    pub const fn array(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Array,
        }
    }

    pub const fn lazy(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Lazy,
        }
    }
}

/// Function family, used for grouping in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionCategory {
    Aggregation,
    Lookup,
    Logical,
    Information,
    Date,
    Financial,
    Text,
    Math,
    Statistical,
}

impl FunctionCategory {
    pub const ALL: [FunctionCategory; 9] = [
        FunctionCategory::Aggregation,
        FunctionCategory::Lookup,
        FunctionCategory::Logical,
        FunctionCategory::Information,
        FunctionCategory::Date,
        FunctionCategory::Financial,
        FunctionCategory::Text,
        FunctionCategory::Math,
        FunctionCategory::Statistical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Aggregation => "aggregation",
            FunctionCategory::Lookup => "lookup",
            FunctionCategory::Logical => "logical",
            FunctionCategory::Information => "information",
            FunctionCategory::Date => "date",
            FunctionCategory::Financial => "financial",
            FunctionCategory::Text => "text",
            FunctionCategory::Math => "math",
            FunctionCategory::Statistical => "statistical",
        }
    }

    /// Parse a category name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function implementation
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    /// Receives evaluated arguments
    Eager(fn(&[FormulaValue]) -> FnResult),
    /// Decides itself which arguments to evaluate
    Lazy(fn(&LazyArgs<'_>) -> FormulaResult<FormulaValue>),
}

impl fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionImpl::Eager(_) => f.write_str("Eager"),
            FunctionImpl::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Function definition
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    pub category: FunctionCategory,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Declared parameters, in order
    pub params: &'static [Param],
    /// How many trailing params repeat for further arguments (0 = none)
    pub repeat: usize,
    /// Implementation
    pub implementation: FunctionImpl,
    /// What the function computes and how it treats its arguments
    pub description: &'static str,
}

impl FunctionDef {
    pub const fn eager(
        name: &'static str,
        category: FunctionCategory,
        min_args: usize,
        max_args: Option<usize>,
        params: &'static [Param],
        f: fn(&[FormulaValue]) -> FnResult,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            category,
            min_args,
            max_args,
            params,
            repeat: 0,
            implementation: FunctionImpl::Eager(f),
            description,
        }
    }

    pub const fn lazy(
        name: &'static str,
        category: FunctionCategory,
        min_args: usize,
        max_args: Option<usize>,
        params: &'static [Param],
        f: fn(&LazyArgs<'_>) -> FormulaResult<FormulaValue>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            category,
            min_args,
            max_args,
            params,
            repeat: 0,
            implementation: FunctionImpl::Lazy(f),
            description,
        }
    }

    /// Mark the last `count` params as repeating
    pub const fn repeating(mut self, count: usize) -> Self {
        self.repeat = count;
        self
    }

    /// Kind of the argument at `index`, following repetition
    pub fn arg_kind(&self, index: usize) -> ArgKind {
        self.param(index).map_or(ArgKind::Scalar, |p| p.kind)
    }

    /// Parameter describing the argument at `index`, following repetition
    pub fn param(&self, index: usize) -> Option<&Param> {
        let len = self.params.len();
        if index < len {
            return self.params.get(index);
        }
        if self.repeat == 0 || self.repeat > len {
            return self.params.last();
        }
        let first = len - self.repeat;
        self.params.get(first + (index - first) % self.repeat)
    }

    /// Whether the function is lazy
    pub fn is_lazy(&self) -> bool {
        matches!(self.implementation, FunctionImpl::Lazy(_))
    }

    /// Describe an arity violation, if `count` arguments are not accepted
    pub fn arity_error(&self, count: usize) -> Option<String> {
        if count < self.min_args {
            return Some(format!(
                "{} expects at least {} argument(s), got {}",
                self.name, self.min_args, count
            ));
        }
        if let Some(max) = self.max_args {
            if count > max {
                return Some(format!(
                    "{} expects at most {} argument(s), got {}",
                    self.name, max, count
                ));
            }
        }
        None
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_all(statistical::FUNCTIONS);
        registry.register_all(lookup::FUNCTIONS);
        registry.register_all(logical::FUNCTIONS);
        registry.register_all(info::FUNCTIONS);
        registry.register_all(date::FUNCTIONS);
        registry.register_all(financial::FUNCTIONS);
        registry.register_all(text::FUNCTIONS);
        registry.register_all(math::FUNCTIONS);
        registry.register_all(distribution::FUNCTIONS);

        debug!(functions = registry.len(), "function registry built");
        registry
    }

    /// The shared registry of built-in functions, built on first use
    pub fn global() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FunctionRegistry::new)
    }

    /// Look up a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_uppercase().as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any previous definition with that name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    fn register_all(&mut self, defs: &[FunctionDef]) {
        for def in defs {
            self.register(*def);
        }
    }

    /// All functions sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        let mut defs: Vec<&FunctionDef> = self.functions.values().collect();
        defs.sort_by_key(|def| def.name);
        defs.into_iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// === Shared argument helpers ===

pub(crate) fn value_error<S: AsRef<str>>(detail: S) -> CellError {
    CellError::with_detail(ErrorKind::InvalidValue, detail)
}

pub(crate) fn num_error<S: AsRef<str>>(detail: S) -> CellError {
    CellError::with_detail(ErrorKind::NumericError, detail)
}

pub(crate) fn div_zero() -> CellError {
    CellError::new(ErrorKind::DivideByZero)
}

pub(crate) fn not_available<S: AsRef<str>>(detail: S) -> CellError {
    CellError::with_detail(ErrorKind::NotAvailable, detail)
}

/// Argument as a number
pub(crate) fn number_arg(args: &[FormulaValue], index: usize) -> Result<f64, CellError> {
    args.get(index)
        .ok_or_else(|| value_error("missing argument"))?
        .to_number()
}

/// Optional numeric argument; missing or blank takes the default
pub(crate) fn opt_number(
    args: &[FormulaValue],
    index: usize,
    default: f64,
) -> Result<f64, CellError> {
    match args.get(index) {
        None | Some(FormulaValue::Blank) => Ok(default),
        Some(value) => value.to_number(),
    }
}

/// Argument truncated toward zero
pub(crate) fn int_arg(args: &[FormulaValue], index: usize) -> Result<f64, CellError> {
    Ok(number_arg(args, index)?.trunc())
}

pub(crate) fn opt_int(args: &[FormulaValue], index: usize, default: f64) -> Result<f64, CellError> {
    Ok(opt_number(args, index, default)?.trunc())
}

pub(crate) fn bool_arg(args: &[FormulaValue], index: usize) -> Result<bool, CellError> {
    args.get(index)
        .ok_or_else(|| value_error("missing argument"))?
        .to_bool()
}

pub(crate) fn opt_bool(args: &[FormulaValue], index: usize, default: bool) -> Result<bool, CellError> {
    match args.get(index) {
        None | Some(FormulaValue::Blank) => Ok(default),
        Some(value) => value.to_bool(),
    }
}

pub(crate) fn text_arg(args: &[FormulaValue], index: usize) -> Result<String, CellError> {
    args.get(index)
        .ok_or_else(|| value_error("missing argument"))?
        .to_text()
}

/// All values of an argument: the elements of an array, or the scalar itself
pub(crate) fn flat(value: &FormulaValue) -> Vec<&FormulaValue> {
    match value {
        FormulaValue::Array(rows) => rows.iter().flatten().collect(),
        scalar => vec![scalar],
    }
}

/// Dimensions of an argument as a grid
pub(crate) fn dims(value: &FormulaValue) -> (usize, usize) {
    match value {
        FormulaValue::Array(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
        _ => (1, 1),
    }
}

/// Element of an argument viewed as a grid
pub(crate) fn cell(value: &FormulaValue, row: usize, col: usize) -> Option<&FormulaValue> {
    match value {
        FormulaValue::Array(rows) => rows.get(row).and_then(|r| r.get(col)),
        scalar if row == 0 && col == 0 => Some(scalar),
        _ => None,
    }
}

/// How values inside ranges are collected for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collect {
    /// Numbers only
    Numbers,
    /// Numbers, with TRUE=1, FALSE=0 and text=0 (the `*A` variants)
    Values,
}

/// Numbers from aggregation arguments
///
/// Range values follow `mode`; direct scalar arguments count numbers,
/// booleans and numeric text, and other text is `#VALUE!`. Errors anywhere
/// propagate.
pub(crate) fn collect_numbers(args: &[FormulaValue], mode: Collect) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        FormulaValue::Number(n) => numbers.push(*n),
                        FormulaValue::Error(e) => return Err(e.clone()),
                        FormulaValue::Boolean(b) if mode == Collect::Values => {
                            numbers.push(if *b { 1.0 } else { 0.0 })
                        }
                        FormulaValue::Text(_) if mode == Collect::Values => numbers.push(0.0),
                        _ => {}
                    }
                }
            }
            FormulaValue::Blank => {}
            scalar => numbers.push(scalar.to_number()?),
        }
    }
    Ok(numbers)
}

/// Numbers inside an array argument only, errors propagating
pub(crate) fn array_numbers(value: &FormulaValue) -> Result<Vec<f64>, CellError> {
    collect_numbers(std::slice::from_ref(value), Collect::Numbers)
}
