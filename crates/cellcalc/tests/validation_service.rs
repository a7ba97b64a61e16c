//! Tests for the validation service, configuration and tool surface

use cellcalc::prelude::*;
use cellcalc::validation::RejectionKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Test that error values are valid while malformed formulas are not
#[test]
fn test_validation_distinguishes_errors_from_syntax() {
    assert!(validate_syntax("=1/0").is_valid);
    assert!(validate_syntax("=NA()").is_valid);
    assert!(!validate_syntax("=SUM(").is_valid);
    assert!(!validate_syntax("SUM(1)").is_valid);
    assert!(!validate_syntax("=1+*2").is_valid);
}

/// Test evaluation against a table with headers
#[test]
fn test_evaluate_with_headers() {
    let headers = headers(&["product", "units", "price"]);
    let rows = vec![
        vec![CellValue::from("pen"), CellValue::from(10), CellValue::from(1.5)],
        vec![CellValue::from("book"), CellValue::from(2), CellValue::from(12)],
        vec![CellValue::from("pen"), CellValue::from(4), CellValue::from(1.5)],
    ];

    let outcome = evaluate_with_sample("=SUMIF(A2:A4,\"pen\",B2:B4)", &headers, &rows);
    assert_eq!(outcome, EvaluationOutcome::Value(ResultValue::Number(14.0)));

    let outcome = evaluate_with_sample("=INDEX(A2:C4,MATCH(\"book\",A2:A4,0),3)", &headers, &rows);
    assert_eq!(outcome, EvaluationOutcome::Value(ResultValue::Number(12.0)));

    let outcome = evaluate_with_sample("=AVERAGE(D2:D4)", &headers, &rows);
    assert_eq!(
        serde_json::to_value(&outcome).unwrap()["error"],
        json!("#DIV/0!")
    );
}

/// Test formula cells inside caller rows
#[test]
fn test_formula_cells_in_rows() {
    let headers = headers(&["a", "b"]);
    let rows = vec![
        vec![CellValue::from(2), CellValue::from("=A2*10")],
        vec![CellValue::from(3), CellValue::from("=B3")],
    ];

    let outcome = evaluate_with_sample("=B2", &headers, &rows);
    assert_eq!(outcome, EvaluationOutcome::Value(ResultValue::Number(20.0)));

    // B3 reads itself
    let outcome = evaluate_with_sample("=B3", &headers, &rows);
    assert_eq!(
        outcome,
        EvaluationOutcome::SpreadsheetError(CellError::new(ErrorKind::InvalidReference))
    );
}

/// Test a long column of chained formula cells
#[test]
fn test_chained_formula_column() {
    let n = 20_000;
    let mut rows = vec![vec![CellValue::from(1)]];
    rows.extend((1..n).map(|row| vec![CellValue::from(format!("=A{}+1", row))]));

    let outcome = evaluate_with_sample(&format!("=A{}", n), &[], &rows);
    assert_eq!(outcome, EvaluationOutcome::Value(ResultValue::Number(n as f64)));
}

/// Test configuration loading from a file
#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "sample": {{ "headers": ["x"], "rows": [[5], [7]] }} }}"#
    )
    .unwrap();

    let config = ServiceConfig::from_path(file.path()).unwrap();
    let validator = Validator::new(config);
    let check = validator.validate_syntax("=SUM(A2:A3)");
    assert_eq!(check.value, Some(ResultValue::Number(12.0)));

    let missing = ServiceConfig::from_path(file.path().with_extension("missing"));
    assert!(matches!(missing, Err(Error::Io { .. })));
}

/// Test that depth limits reject instead of overflowing
#[test]
fn test_deep_nesting_is_rejected() {
    let formula = format!("={}1{}", "(".repeat(5000), ")".repeat(5000));
    let check = validate_syntax(&formula);
    assert!(!check.is_valid);

    let outcome = evaluate_with_sample(&formula, &[], &[]);
    match outcome {
        EvaluationOutcome::Rejected(rejection) => {
            assert_eq!(rejection.kind, RejectionKind::ParseError)
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
}

/// Test the tool catalog end to end
#[test]
fn test_tool_catalog() {
    let catalog = ToolCatalog::new();
    assert!(catalog.get("evaluate_formula").is_some());
    assert!(catalog.get("NORM.DIST").is_some());

    let output = catalog
        .call(
            "evaluate_formula",
            &json!({
                "formula": "=COUNTIF(A2:A4,\">1\")",
                "headers": ["n"],
                "dataRows": [[1], [2], [3]]
            }),
        )
        .unwrap();
    assert_eq!(output, json!({ "result": 2.0 }));

    let output = catalog
        .call("IFERROR", &json!({ "value": "#N/A", "value_if_error": 0 }))
        .unwrap();
    // Text that looks like an error code is still text
    assert_eq!(output, json!({ "result": "#N/A" }));

    let output = catalog.call("SQRT", &json!({ "number": -1 })).unwrap();
    assert_eq!(output["error"], json!("#NUM!"));
}
