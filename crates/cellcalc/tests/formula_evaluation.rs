//! Tests for formula evaluation against sheets

use cellcalc::prelude::*;
use cellcalc::{evaluate, parse_formula, recalculate, EvaluationContext};
use pretty_assertions::assert_eq;

fn eval_on(sheet: &Sheet, formula: &str) -> FormulaValue {
    let ast = parse_formula(formula).unwrap();
    evaluate(&ast, &EvaluationContext::new(sheet)).unwrap()
}

fn eval(formula: &str) -> FormulaValue {
    eval_on(&Sheet::empty(), formula)
}

fn column(values: &[CellValue]) -> Sheet {
    Sheet::new(vec![], values.iter().map(|v| vec![v.clone()]).collect())
}

/// Test operator precedence and associativity
#[test]
fn test_operator_precedence() {
    assert_eq!(eval("=2+3*4"), FormulaValue::Number(14.0));
    assert_eq!(eval("=(2+3)*4"), FormulaValue::Number(20.0));
    assert_eq!(eval("=2^3^2"), FormulaValue::Number(512.0));
    assert_eq!(eval("=1+2*3^2"), FormulaValue::Number(19.0));
    // Concatenation binds tighter than binary +
    assert_eq!(eval("=1+2&3"), FormulaValue::Number(24.0));
    assert_eq!(eval("=-2^2"), FormulaValue::Number(-4.0));
    assert_eq!(eval("=1+1=2"), FormulaValue::Boolean(true));
}

/// Test that errors poison the enclosing expression
#[test]
fn test_error_propagation() {
    assert_eq!(eval("=1/0+5"), FormulaValue::error(ErrorKind::DivideByZero));
    assert_eq!(eval("=IFERROR(1/0,99)"), FormulaValue::Number(99.0));
    assert_eq!(eval("=NOSUCHFUNC(1)"), FormulaValue::error(ErrorKind::NameNotFound));
    assert_eq!(eval("=\"a\"+1"), FormulaValue::error(ErrorKind::InvalidValue));
}

/// Test that only the chosen IF branch is evaluated
#[test]
fn test_lazy_branches() {
    assert_eq!(eval("=IF(TRUE,1,1/0)"), FormulaValue::Number(1.0));
    assert_eq!(eval("=IF(FALSE,1/0,2)"), FormulaValue::Number(2.0));
    assert_eq!(eval("=CHOOSE(2,1/0,\"b\")"), FormulaValue::text("b"));
    assert_eq!(eval("=IF(1/0,1,2)"), FormulaValue::error(ErrorKind::DivideByZero));
}

/// Test SUM and AVERAGE over ranges
#[test]
fn test_range_aggregation() {
    let sheet = column(&[CellValue::from(1), CellValue::from(2), CellValue::from(3)]);
    assert_eq!(eval_on(&sheet, "=SUM(A1:A3)"), FormulaValue::Number(6.0));
    assert_eq!(eval_on(&sheet, "=AVERAGE(A1:A3)"), FormulaValue::Number(2.0));
    assert_eq!(eval_on(&sheet, "=COUNT(A1:A10)"), FormulaValue::Number(3.0));

    let sheet = column(&[
        CellValue::from(1),
        CellValue::error(ErrorKind::InvalidValue),
        CellValue::from(3),
    ]);
    assert_eq!(
        eval_on(&sheet, "=SUM(A1:A3)"),
        FormulaValue::error(ErrorKind::InvalidValue)
    );
}

/// Test VLOOKUP exact matches and misses
#[test]
fn test_vlookup_exact() {
    let sheet = Sheet::new(
        vec![],
        vec![
            vec![CellValue::from("a"), CellValue::from(1)],
            vec![CellValue::from("b"), CellValue::from(2)],
        ],
    );
    assert_eq!(
        eval_on(&sheet, "=VLOOKUP(\"b\",A1:B2,2,FALSE)"),
        FormulaValue::Number(2.0)
    );
    assert_eq!(
        eval_on(&sheet, "=VLOOKUP(\"z\",A1:B2,2,FALSE)"),
        FormulaValue::error(ErrorKind::NotAvailable)
    );
}

/// Test that parse, re-serialize, parse again evaluates identically
#[test]
fn test_parser_round_trip() {
    let sheet = column(&[CellValue::from(-4), CellValue::from(2), CellValue::from(9)]);
    for formula in [
        "=SUM(A1:A3)",
        "=IF(A1>0,\"pos\",\"neg\")",
        "=1+2*3^2",
        "=-A1^2",
        "=2^-1",
        "=50%*A3",
        "={1,2;3,-4}",
        "=ROUND(AVERAGE(A1:A3),2)&\" units\"",
        "=VLOOKUP(2,A1:A3,1,FALSE)",
        "=\"say \"\"hi\"\"\"",
    ] {
        let ast = parse_formula(formula).unwrap();
        let text = ast.to_formula_string();
        let reparsed = parse_formula(&text).unwrap();
        assert_eq!(
            eval_on(&sheet, &text),
            eval_on(&sheet, formula),
            "{} re-serialized as {}",
            formula,
            text
        );
        assert_eq!(reparsed.to_formula_string(), text);
    }
}

/// Test that evaluation is free of hidden state
#[test]
fn test_idempotent_evaluation() {
    let sheet = column(&[CellValue::from(1.5), CellValue::from("x"), CellValue::from(4)]);
    let ctx = EvaluationContext::new(&sheet);
    for formula in ["=SUM(A1:A3)/3", "=STDEV(A1:A3)", "=NORM.DIST(A1,0,1,TRUE)", "=A2&A1"] {
        let ast = parse_formula(formula).unwrap();
        let first = evaluate(&ast, &ctx).unwrap();
        let second = evaluate(&ast, &ctx).unwrap();
        match (&first, &second) {
            (FormulaValue::Number(a), FormulaValue::Number(b)) => {
                assert_eq!(a.to_bits(), b.to_bits(), "{}", formula)
            }
            _ => assert_eq!(first, second, "{}", formula),
        }
    }
}

/// Test formula cells in caller data
#[test]
fn test_formula_cells_are_recalculated() {
    let sheet = column(&[
        CellValue::from(3),
        CellValue::from("=A1*2"),
        CellValue::from("=A2+A1"),
    ]);
    let (computed, stats) = recalculate(&sheet, &CalculationOptions::default()).unwrap();
    assert_eq!(eval_on(&computed, "=SUM(A1:A3)"), FormulaValue::Number(18.0));
    assert_eq!(stats.cells_calculated, 2);
}
