//! Logical functions

use super::{bool_arg, value_error, FnResult, FunctionCategory::Logical, FunctionDef, Param};
use crate::error::FormulaResult;
use crate::evaluator::LazyArgs;
use crate::value::{compare_values, FormulaValue};
use cellcalc_core::{CellError, ErrorKind};
use std::cmp::Ordering;

const LOGICALS: &[Param] = &[Param::array("logical")];

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::lazy("IF", Logical, 2, Some(3),
        &[Param::lazy("logical_test"), Param::lazy("value_if_true"), Param::lazy("value_if_false")],
        fn_if,
        "Returns value_if_true when logical_test is TRUE (or a non-zero number), otherwise value_if_false (FALSE when omitted). \
         Only the chosen branch is evaluated."),
    FunctionDef::eager("AND", Logical, 1, None, LOGICALS, fn_and,
        "TRUE when every argument is TRUE. Numbers count as TRUE when non-zero; text in ranges is ignored. #VALUE! when there is nothing to test.").repeating(1),
    FunctionDef::eager("OR", Logical, 1, None, LOGICALS, fn_or,
        "TRUE when any argument is TRUE. Numbers count as TRUE when non-zero; text in ranges is ignored. #VALUE! when there is nothing to test.").repeating(1),
    FunctionDef::eager("XOR", Logical, 1, None, LOGICALS, fn_xor,
        "TRUE when an odd number of arguments are TRUE. Numbers count as TRUE when non-zero; text in ranges is ignored.").repeating(1),
    FunctionDef::eager("NOT", Logical, 1, Some(1), &[Param::scalar("logical")], fn_not,
        "Reverses a logical value; numbers are TRUE when non-zero."),
    FunctionDef::lazy("IFS", Logical, 2, None,
        &[Param::lazy("logical_test"), Param::lazy("value_if_true")],
        fn_ifs,
        "Returns the value paired with the first TRUE test, evaluating tests left to right and only the chosen value. \
         #N/A when no test is TRUE; #VALUE! when tests and values are not paired.").repeating(2),
    FunctionDef::lazy("SWITCH", Logical, 3, None,
        &[Param::lazy("expression"), Param::lazy("value"), Param::lazy("result")],
        fn_switch,
        "Compares expression against each value (text case-insensitively) and returns the result paired with the first match. \
         A trailing unpaired argument is the default; #N/A when nothing matches and there is no default.").repeating(2),
    FunctionDef::lazy("IFERROR", Logical, 2, Some(2),
        &[Param::lazy("value"), Param::lazy("value_if_error")],
        fn_iferror,
        "Returns value unless it is an error, in which case value_if_error is evaluated and returned."),
    FunctionDef::lazy("IFNA", Logical, 2, Some(2),
        &[Param::lazy("value"), Param::lazy("value_if_na")],
        fn_ifna,
        "Returns value unless it is #N/A, in which case value_if_na is evaluated and returned. Other errors pass through."),
    FunctionDef::eager("TRUE", Logical, 0, Some(0), &[], fn_true,
        "The logical value TRUE."),
    FunctionDef::eager("FALSE", Logical, 0, Some(0), &[], fn_false,
        "The logical value FALSE."),
];

/// Condition of a lazy branch function, or the error value to return
fn condition(value: FormulaValue) -> Result<bool, FormulaValue> {
    match value {
        FormulaValue::Error(e) => Err(FormulaValue::Error(e)),
        value => value.to_bool().map_err(FormulaValue::Error),
    }
}

/// IF(logical_test, value_if_true, [value_if_false])
pub fn fn_if(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    let test = match condition(args.value(0)?) {
        Ok(test) => test,
        Err(error) => return Ok(error),
    };

    if test {
        args.result(1)
    } else if args.len() > 2 {
        args.result(2)
    } else {
        Ok(FormulaValue::Boolean(false))
    }
}

/// Logical values of AND/OR/XOR arguments
///
/// Range text and blanks are skipped; direct arguments must coerce.
fn logical_values(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                for value in rows.iter().flatten() {
                    match value {
                        FormulaValue::Boolean(b) => values.push(*b),
                        FormulaValue::Number(n) => values.push(*n != 0.0),
                        FormulaValue::Error(e) => return Err(e.clone()),
                        _ => {}
                    }
                }
            }
            FormulaValue::Blank => {}
            scalar => values.push(scalar.to_bool()?),
        }
    }
    if values.is_empty() {
        return Err(value_error("no logical values"));
    }
    Ok(values)
}

/// AND(logical1, [logical2], ...)
pub fn fn_and(args: &[FormulaValue]) -> FnResult {
    let values = logical_values(args)?;
    Ok(FormulaValue::Boolean(values.iter().all(|b| *b)))
}

/// OR(logical1, [logical2], ...)
pub fn fn_or(args: &[FormulaValue]) -> FnResult {
    let values = logical_values(args)?;
    Ok(FormulaValue::Boolean(values.iter().any(|b| *b)))
}

/// XOR(logical1, [logical2], ...)
pub fn fn_xor(args: &[FormulaValue]) -> FnResult {
    let values = logical_values(args)?;
    Ok(FormulaValue::Boolean(values.iter().filter(|b| **b).count() % 2 == 1))
}

/// NOT(logical)
pub fn fn_not(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Boolean(!bool_arg(args, 0)?))
}

/// IFS(logical_test1, value_if_true1, ...)
pub fn fn_ifs(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    if args.len() % 2 != 0 {
        return Ok(FormulaValue::Error(value_error(
            "IFS expects test/value pairs",
        )));
    }

    for pair in (0..args.len()).step_by(2) {
        match condition(args.value(pair)?) {
            Ok(true) => return args.result(pair + 1),
            Ok(false) => {}
            Err(error) => return Ok(error),
        }
    }

    Ok(FormulaValue::Error(CellError::with_detail(
        ErrorKind::NotAvailable,
        "no condition was TRUE",
    )))
}

/// Equality used by SWITCH: same type, text case-insensitive
fn switch_matches(a: &FormulaValue, b: &FormulaValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b) && compare_values(a, b) == Ordering::Equal
}

/// SWITCH(expression, value1, result1, ..., [default])
pub fn fn_switch(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    let expression = args.value(0)?;
    if expression.is_error() {
        return Ok(expression);
    }

    let cases = args.len() - 1;
    for case in (1..cases).step_by(2) {
        let value = args.value(case)?;
        if value.is_error() {
            return Ok(value);
        }
        if switch_matches(&expression, &value) {
            return args.result(case + 1);
        }
    }

    if cases % 2 == 1 {
        return args.result(args.len() - 1);
    }
    Ok(FormulaValue::Error(CellError::with_detail(
        ErrorKind::NotAvailable,
        "no value matched",
    )))
}

/// IFERROR(value, value_if_error)
pub fn fn_iferror(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    match args.result(0)? {
        FormulaValue::Error(_) => args.result(1),
        value => Ok(value),
    }
}

/// IFNA(value, value_if_na)
pub fn fn_ifna(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    match args.result(0)? {
        FormulaValue::Error(e) if e.kind == ErrorKind::NotAvailable => args.result(1),
        value => Ok(value),
    }
}

pub fn fn_true(_args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Boolean(true))
}

pub fn fn_false(_args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Boolean(false))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{eval, eval_with, grid, num};
    use crate::FormulaValue;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    #[test]
    fn test_if_is_lazy() {
        assert_eq!(eval("=IF(TRUE,1,1/0)"), num(1.0));
        assert_eq!(eval("=IF(FALSE,1/0,2)"), num(2.0));
        assert_eq!(eval("=IF(0,1)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=IF(1/0,1,2)"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("=IF(\"maybe\",1,2)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_if_returns_ranges() {
        let sheet = grid(&[&["1"], &["2"], &["3"]]);
        assert_eq!(eval_with(&sheet, "=SUM(IF(TRUE,A1:A3,0))"), num(6.0));
        assert_eq!(eval_with(&sheet, "=IF(TRUE,A2,0)"), num(2.0));
    }

    #[test]
    fn test_and_or_xor_not() {
        assert_eq!(eval("=AND(TRUE,1,\"TRUE\")"), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(TRUE,0)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=OR(FALSE,0,1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=XOR(TRUE,TRUE,TRUE)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=NOT(0)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(\"x\")"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=OR(A1:A3)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_ifs() {
        assert_eq!(eval("=IFS(FALSE,1/0,TRUE,\"b\")"), FormulaValue::text("b"));
        assert_eq!(eval("=IFS(FALSE,1)"), err(ErrorKind::NotAvailable));
        assert_eq!(eval("=IFS(TRUE,1,FALSE)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_switch() {
        assert_eq!(eval("=SWITCH(2,1,\"one\",2,\"two\")"), FormulaValue::text("two"));
        assert_eq!(eval("=SWITCH(\"B\",\"a\",1,\"b\",2)"), num(2.0));
        assert_eq!(eval("=SWITCH(9,1,\"one\",\"other\")"), FormulaValue::text("other"));
        assert_eq!(eval("=SWITCH(9,1,\"one\")"), err(ErrorKind::NotAvailable));
        assert_eq!(eval("=SWITCH(1,1,\"one\",2,1/0)"), FormulaValue::text("one"));
    }

    #[test]
    fn test_iferror_ifna() {
        assert_eq!(eval("=IFERROR(1/0,99)"), num(99.0));
        assert_eq!(eval("=IFERROR(5,1/0)"), num(5.0));
        assert_eq!(eval("=IFNA(NA(),\"none\")"), FormulaValue::text("none"));
        assert_eq!(eval("=IFNA(1/0,\"none\")"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_true_false_functions() {
        assert_eq!(eval("=TRUE()"), FormulaValue::Boolean(true));
        assert_eq!(eval("=FALSE()"), FormulaValue::Boolean(false));
    }
}
