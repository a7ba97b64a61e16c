//! Tool surface
//!
//! Publishes evaluation as named tools with JSON Schema inputs: one tool to
//! evaluate a formula against data, one to check formula syntax, and one per
//! built-in function. Calls only translate JSON to and from the validation
//! service; every decision about values is made by the evaluator.
//!
//! ```rust
//! use cellcalc::tools::ToolCatalog;
//! use serde_json::json;
//!
//! let catalog = ToolCatalog::new();
//! let output = catalog.call("SUM", &json!({ "number": [1, 2, [3, 4]] })).unwrap();
//! assert_eq!(output, json!({ "result": 10.0 }));
//! ```

use crate::validation::{EvaluationOutcome, Validator};
use crate::{ArgKind, CellValue, FormulaExpr, FunctionDef, FunctionRegistry, Sheet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

/// Name of the tool evaluating a formula against caller data
pub const EVALUATE_FORMULA: &str = "evaluate_formula";

/// Name of the tool checking formula syntax
pub const CHECK_FORMULA_SYNTAX: &str = "check_formula_syntax";

/// Errors from calling a tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {message}")]
    InvalidInput { tool: String, message: String },

    /// The call could not be evaluated (parse failure or resource limit)
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

impl ToolError {
    fn invalid(tool: &str, message: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// A published tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the input object
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateInput {
    formula: String,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    data_rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
struct CheckInput {
    formula: String,
}

/// Catalog of every tool, bound to a validator
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    validator: Validator,
    tools: Vec<ToolDescriptor>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCatalog {
    /// Catalog using the default configuration
    pub fn new() -> Self {
        Self::with_validator(Validator::default())
    }

    pub fn with_validator(validator: Validator) -> Self {
        let mut tools = vec![evaluate_formula_descriptor(), check_syntax_descriptor()];
        tools.extend(FunctionRegistry::global().iter().map(function_descriptor));
        Self { validator, tools }
    }

    /// All tools, service tools first, then functions by name
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Look up a tool; function tools match case-insensitively
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools
            .iter()
            .find(|tool| tool.name == name)
            .or_else(|| self.tools.iter().find(|tool| tool.name.eq_ignore_ascii_case(name)))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool with a JSON input object
    pub fn call(&self, name: &str, input: &Value) -> Result<Value, ToolError> {
        debug!(tool = name, "tool call");
        match name {
            EVALUATE_FORMULA => {
                let input: EvaluateInput = parse_input(name, input)?;
                let outcome = self.validator.evaluate_with_sample(
                    &input.formula,
                    &input.headers,
                    &input.data_rows,
                );
                to_json(&outcome)
            }
            CHECK_FORMULA_SYNTAX => {
                let input: CheckInput = parse_input(name, input)?;
                to_json(&self.validator.validate_syntax(&input.formula))
            }
            _ => {
                let def = FunctionRegistry::global()
                    .get(name)
                    .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
                let expr = function_call(def, input)?;
                match self.validator.evaluate_expr(&expr, &Sheet::empty()) {
                    EvaluationOutcome::Rejected(rejection) => {
                        Err(ToolError::Evaluation(rejection.message))
                    }
                    outcome => to_json(&outcome),
                }
            }
        }
    }
}

fn parse_input<T: for<'de> Deserialize<'de>>(tool: &str, input: &Value) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Evaluation(e.to_string()))
}

fn evaluate_formula_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: EVALUATE_FORMULA.to_string(),
        description: "Evaluates a spreadsheet formula against tabular data. Headers occupy row 1 \
                      when given, data rows follow. Returns {result} or {error, errorKind}; \
                      spreadsheet errors such as #DIV/0! are results, not failures."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "formula": { "type": "string", "description": "Formula text, e.g. =SUM(A2:A10)" },
                "headers": { "type": "array", "items": { "type": "string" } },
                "dataRows": {
                    "type": "array",
                    "items": { "type": "array", "items": cell_schema() }
                }
            },
            "required": ["formula"]
        }),
    }
}

fn check_syntax_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: CHECK_FORMULA_SYNTAX.to_string(),
        description: "Checks whether a formula parses and evaluates on a small sample grid. \
                      A formula producing a spreadsheet error value is still valid."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "formula": { "type": "string" }
            },
            "required": ["formula"]
        }),
    }
}

fn cell_schema() -> Value {
    json!({ "type": ["number", "string", "boolean", "null"] })
}

fn param_schema(kind: ArgKind) -> Value {
    match kind {
        ArgKind::Array => json!({
            "type": ["number", "string", "boolean", "null", "array"],
            "description": "A value, a list (one column) or a list of rows"
        }),
        ArgKind::Scalar | ArgKind::Lazy => cell_schema(),
    }
}

/// Number of trailing params that take further arguments
fn repeating_params(def: &FunctionDef) -> usize {
    let len = def.params.len();
    if def.repeat > 0 && def.repeat <= len {
        def.repeat
    } else if def.max_args.is_none() {
        len.min(1)
    } else {
        0
    }
}

fn function_descriptor(def: &FunctionDef) -> ToolDescriptor {
    let fixed = def.params.len() - repeating_params(def);
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (index, param) in def.params.iter().enumerate() {
        let schema = if index < fixed {
            param_schema(param.kind)
        } else {
            json!({ "type": "array", "items": param_schema(param.kind) })
        };
        properties.insert(param.name.to_string(), schema);
        if index < def.min_args.min(fixed) || (index >= fixed && def.min_args > fixed) {
            required.push(param.name);
        }
    }

    ToolDescriptor {
        name: def.name.to_string(),
        description: def.description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required
        }),
    }
}

/// Build a literal call of `def` from a JSON input object
fn function_call(def: &FunctionDef, input: &Value) -> Result<FormulaExpr, ToolError> {
    let empty = Map::new();
    let fields = match input {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ToolError::invalid(def.name, "input must be an object")),
    };
    if let Some(unknown) = fields
        .keys()
        .find(|key| !def.params.iter().any(|p| p.name == key.as_str()))
    {
        return Err(ToolError::invalid(def.name, format!("unknown parameter {}", unknown)));
    }

    let fixed = def.params.len() - repeating_params(def);
    let mut args = Vec::new();
    for param in &def.params[..fixed] {
        match fields.get(param.name) {
            Some(value) => args.push(literal(def.name, value)?),
            None => args.push(FormulaExpr::Literal(CellValue::Blank)),
        }
    }

    let group: Vec<&[Value]> = def.params[fixed..]
        .iter()
        .map(|param| match fields.get(param.name) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => std::slice::from_ref(other),
            None => &[],
        })
        .collect();
    let rounds = group.iter().map(|items| items.len()).max().unwrap_or(0);
    if group.iter().any(|items| items.len() != rounds) {
        return Err(ToolError::invalid(
            def.name,
            "repeating parameters need the same number of values",
        ));
    }

    if rounds == 0 {
        // Omitted trailing optionals are not passed at all
        let present = def.params[..fixed]
            .iter()
            .rposition(|param| fields.contains_key(param.name))
            .map_or(0, |index| index + 1);
        args.truncate(present);
    }
    for round in 0..rounds {
        for items in &group {
            args.push(literal(def.name, &items[round])?);
        }
    }

    if let Some(message) = def.arity_error(args.len()) {
        return Err(ToolError::invalid(def.name, message));
    }
    Ok(FormulaExpr::call(def.name, args))
}

fn literal(tool: &str, value: &Value) -> Result<FormulaExpr, ToolError> {
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
            let mut rows = Vec::with_capacity(items.len());
            for row in items.iter().filter_map(Value::as_array) {
                rows.push(row.iter().map(|v| scalar(tool, v)).collect::<Result<Vec<_>, _>>()?);
            }
            let width = rows.first().map_or(0, Vec::len);
            if width == 0 || rows.iter().any(|row| row.len() != width) {
                return Err(ToolError::invalid(tool, "array rows must be non-empty and equally long"));
            }
            Ok(FormulaExpr::Array(rows))
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err(ToolError::invalid(tool, "empty array"));
            }
            let rows = items
                .iter()
                .map(|v| scalar(tool, v).map(|cell| vec![cell]))
                .collect::<Result<_, _>>()?;
            Ok(FormulaExpr::Array(rows))
        }
        other => scalar(tool, other),
    }
}

fn scalar(tool: &str, value: &Value) -> Result<FormulaExpr, ToolError> {
    let cell = match value {
        Value::Null => CellValue::Blank,
        Value::Bool(b) => CellValue::Boolean(*b),
        Value::Number(n) => match n.as_f64() {
            Some(n) => CellValue::Number(n),
            None => return Err(ToolError::invalid(tool, format!("unrepresentable number {}", n))),
        },
        Value::String(s) => CellValue::from(s.as_str()),
        Value::Array(_) | Value::Object(_) => {
            return Err(ToolError::invalid(tool, "nested values must be scalars"))
        }
    };
    Ok(FormulaExpr::Literal(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_lists_service_and_function_tools() {
        let catalog = ToolCatalog::new();
        assert_eq!(catalog.len(), FunctionRegistry::global().len() + 2);
        assert_eq!(catalog.tools()[0].name, EVALUATE_FORMULA);
        assert_eq!(catalog.tools()[1].name, CHECK_FORMULA_SYNTAX);

        let vlookup = catalog.get("vlookup").unwrap();
        assert_eq!(vlookup.name, "VLOOKUP");
        assert_eq!(
            vlookup.input_schema["required"],
            json!(["lookup_value", "table_array", "col_index_num"])
        );
        assert!(vlookup.description.contains("range_lookup"));

        let sum = catalog.get("SUM").unwrap();
        assert_eq!(sum.input_schema["properties"]["number"]["type"], json!("array"));
        assert_eq!(sum.input_schema["required"], json!(["number"]));

        let json = serde_json::to_value(sum).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[test]
    fn test_evaluate_formula_tool() {
        let catalog = ToolCatalog::new();
        let output = catalog
            .call(
                EVALUATE_FORMULA,
                &json!({
                    "formula": "=SUM(B2:B3)",
                    "headers": ["item", "qty"],
                    "dataRows": [["a", 2], ["b", 5]]
                }),
            )
            .unwrap();
        assert_eq!(output, json!({ "result": 7.0 }));

        let output = catalog
            .call(EVALUATE_FORMULA, &json!({ "formula": "=1/0" }))
            .unwrap();
        assert_eq!(output["error"], json!("#DIV/0!"));
    }

    #[test]
    fn test_check_syntax_tool() {
        let catalog = ToolCatalog::new();
        let output = catalog
            .call(CHECK_FORMULA_SYNTAX, &json!({ "formula": "=A1+B2" }))
            .unwrap();
        assert_eq!(output, json!({ "isValid": true, "value": 6.0 }));

        let output = catalog
            .call(CHECK_FORMULA_SYNTAX, &json!({ "formula": "=(1" }))
            .unwrap();
        assert_eq!(output["isValid"], json!(false));
    }

    #[test]
    fn test_function_tools() {
        let catalog = ToolCatalog::new();
        let output = catalog
            .call(
                "VLOOKUP",
                &json!({
                    "lookup_value": "b",
                    "table_array": [["a", 1], ["b", 2]],
                    "col_index_num": 2,
                    "range_lookup": false
                }),
            )
            .unwrap();
        assert_eq!(output, json!({ "result": 2.0 }));

        let output = catalog.call("ROUND", &json!({ "number": 2.5 })).unwrap();
        assert_eq!(output, json!({ "result": 3.0 }));

        let output = catalog.call("PI", &Value::Null).unwrap();
        assert_eq!(output, json!({ "result": std::f64::consts::PI }));

        // Each repeated criteria_range is one argument, here a column
        let output = catalog
            .call(
                "SUMIFS",
                &json!({
                    "sum_range": [10, 20, 30],
                    "criteria_range": [["a", "b", "a"]],
                    "criteria": ["a"]
                }),
            )
            .unwrap();
        assert_eq!(output, json!({ "result": 40.0 }));

        let output = catalog
            .call(
                "SUMIFS",
                &json!({
                    "sum_range": [10, 20, 30],
                    "criteria_range": [["a", "b"]],
                    "criteria": ["a"]
                }),
            )
            .unwrap();
        assert_eq!(output["error"], json!("#VALUE!"));
    }

    #[test]
    fn test_function_tool_errors() {
        let catalog = ToolCatalog::new();
        assert!(matches!(
            catalog.call("NOPE", &json!({})),
            Err(ToolError::UnknownTool(_))
        ));
        assert!(matches!(
            catalog.call("ABS", &json!({})),
            Err(ToolError::InvalidInput { .. })
        ));
        assert!(matches!(
            catalog.call("ABS", &json!({ "numbr": 1 })),
            Err(ToolError::InvalidInput { .. })
        ));
        assert!(matches!(
            catalog.call(EVALUATE_FORMULA, &json!({ "headers": [] })),
            Err(ToolError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_lazy_function_tool() {
        let catalog = ToolCatalog::new();
        let output = catalog
            .call(
                "IF",
                &json!({ "logical_test": false, "value_if_true": "yes", "value_if_false": "no" }),
            )
            .unwrap();
        assert_eq!(output, json!({ "result": "no" }));
    }
}
