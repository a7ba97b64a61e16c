//! Property tests for the parser and evaluator

use cellcalc::{evaluate, parse_formula, CellValue, EvaluationContext, FormulaValue, Sheet};
use proptest::prelude::*;

fn sample_sheet() -> Sheet {
    Sheet::new(
        vec![],
        (0..3)
            .map(|row| {
                vec![
                    CellValue::from(row + 1),
                    CellValue::from(format!("t{}", row)),
                    CellValue::Boolean(row % 2 == 0),
                ]
            })
            .collect(),
    )
}

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        (0u32..100).prop_map(|n| format!("{}.5", n)),
        "[A-C][1-4]",
        Just("A1:C3".to_string()),
        Just("TRUE".to_string()),
        Just("\"x\"".to_string()),
    ]
}

fn expression() -> impl Strategy<Value = String> {
    leaf().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), "[-+*/^&<>=]", inner.clone())
                .prop_map(|(a, op, b)| format!("{}{}{}", a, op, b)),
            inner.clone().prop_map(|a| format!("({})", a)),
            inner.clone().prop_map(|a| format!("-{}", a)),
            inner.clone().prop_map(|a| format!("{}%", a)),
            prop::collection::vec(inner.clone(), 1..3)
                .prop_map(|args| format!("SUM({})", args.join(","))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(a, b, c)| format!("IF({},{},{})", a, b, c)),
        ]
    })
}

fn same(a: &FormulaValue, b: &FormulaValue) -> bool {
    match (a, b) {
        (FormulaValue::Number(x), FormulaValue::Number(y)) => x.to_bits() == y.to_bits(),
        (FormulaValue::Array(x), FormulaValue::Array(y)) => {
            x.len() == y.len()
                && x.iter().zip(y).all(|(r, s)| {
                    r.len() == s.len() && r.iter().zip(s).all(|(p, q)| same(p, q))
                })
        }
        _ => a == b,
    }
}

proptest! {
    #[test]
    fn parser_never_panics(text in "\\PC{0,40}") {
        let _ = parse_formula(&text);
        let _ = parse_formula(&format!("={}", text));
    }

    #[test]
    fn formula_like_text_never_panics(body in "[-+*/^&(),:;{}A-D0-9\" <>=%.!#]{0,30}") {
        let sheet = sample_sheet();
        if let Ok(ast) = parse_formula(&format!("={}", body)) {
            let _ = evaluate(&ast, &EvaluationContext::new(&sheet));
        }
    }

    #[test]
    fn reserialized_formulas_evaluate_identically(body in expression()) {
        let sheet = sample_sheet();
        let ctx = EvaluationContext::new(&sheet);
        let ast = parse_formula(&format!("={}", body)).unwrap();
        let reparsed = parse_formula(&ast.to_formula_string()).unwrap();

        let original = evaluate(&ast, &ctx).unwrap();
        let round_trip = evaluate(&reparsed, &ctx).unwrap();
        prop_assert!(
            same(&original, &round_trip),
            "{} gave {:?}, {} gave {:?}",
            body, original, ast.to_formula_string(), round_trip
        );
    }
}
