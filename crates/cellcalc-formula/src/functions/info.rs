//! Information functions
//!
//! The IS* family and ERROR.TYPE inspect error values instead of propagating
//! them, so they are lazy and evaluate their argument themselves.

use super::{not_available, FnResult, FunctionCategory::Information, FunctionDef, Param};
use crate::error::FormulaResult;
use crate::evaluator::LazyArgs;
use crate::value::FormulaValue;
use cellcalc_core::ErrorKind;

const VALUE: &[Param] = &[Param::lazy("value")];

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::lazy("ISBLANK", Information, 1, Some(1), VALUE, fn_isblank,
        "TRUE when value refers to an empty cell. Empty text is not blank."),
    FunctionDef::lazy("ISERROR", Information, 1, Some(1), VALUE, fn_iserror,
        "TRUE when value is any error value."),
    FunctionDef::lazy("ISERR", Information, 1, Some(1), VALUE, fn_iserr,
        "TRUE when value is an error other than #N/A."),
    FunctionDef::lazy("ISNA", Information, 1, Some(1), VALUE, fn_isna,
        "TRUE when value is the #N/A error."),
    FunctionDef::lazy("ISNUMBER", Information, 1, Some(1), VALUE, fn_isnumber,
        "TRUE when value is a number. Numeric text is not a number."),
    FunctionDef::lazy("ISTEXT", Information, 1, Some(1), VALUE, fn_istext,
        "TRUE when value is text."),
    FunctionDef::lazy("ISLOGICAL", Information, 1, Some(1), &[Param::lazy("value")], fn_islogical,
        "TRUE when value is TRUE or FALSE."),
    FunctionDef::lazy("ERROR.TYPE", Information, 1, Some(1), &[Param::lazy("error_val")], fn_error_type,
        "Number of an error value: 1 #NULL!, 2 #DIV/0!, 3 #VALUE!, 4 #REF!, 5 #NAME?, 6 #NUM!, 7 #N/A. #N/A when the argument is not an error."),
    FunctionDef::eager("NA", Information, 0, Some(0), &[], fn_na,
        "The #N/A error value."),
];

fn is(args: &LazyArgs<'_>, test: fn(&FormulaValue) -> bool) -> FormulaResult<FormulaValue> {
    let value = args.value(0)?;
    Ok(FormulaValue::Boolean(test(&value)))
}

pub fn fn_isblank(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, FormulaValue::is_blank)
}

pub fn fn_iserror(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, FormulaValue::is_error)
}

pub fn fn_iserr(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, |v| {
        v.as_error()
            .map_or(false, |e| e.kind != ErrorKind::NotAvailable)
    })
}

pub fn fn_isna(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, |v| {
        v.as_error()
            .map_or(false, |e| e.kind == ErrorKind::NotAvailable)
    })
}

pub fn fn_isnumber(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, |v| matches!(v, FormulaValue::Number(_)))
}

pub fn fn_istext(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, |v| matches!(v, FormulaValue::Text(_)))
}

pub fn fn_islogical(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    is(args, |v| matches!(v, FormulaValue::Boolean(_)))
}

/// ERROR.TYPE(error_val)
pub fn fn_error_type(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    Ok(match args.value(0)? {
        FormulaValue::Error(e) => FormulaValue::Number(f64::from(e.kind.code())),
        _ => FormulaValue::Error(not_available("value is not an error")),
    })
}

/// NA()
pub fn fn_na(_args: &[FormulaValue]) -> FnResult {
    Err(not_available("NA()"))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{eval, eval_with, grid, num};
    use crate::FormulaValue;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn yes() -> FormulaValue {
        FormulaValue::Boolean(true)
    }

    fn no() -> FormulaValue {
        FormulaValue::Boolean(false)
    }

    #[test]
    fn test_error_predicates_see_errors() {
        assert_eq!(eval("=ISERROR(1/0)"), yes());
        assert_eq!(eval("=ISERROR(1)"), no());
        assert_eq!(eval("=ISERR(NA())"), no());
        assert_eq!(eval("=ISERR(1/0)"), yes());
        assert_eq!(eval("=ISNA(NA())"), yes());
        assert_eq!(eval("=ISNA(NOSUCH())"), no());
    }

    #[test]
    fn test_type_predicates() {
        let sheet = grid(&[&["", "5", "five", "TRUE"]]);
        assert_eq!(eval_with(&sheet, "=ISBLANK(A1)"), yes());
        assert_eq!(eval_with(&sheet, "=ISBLANK(B1)"), no());
        assert_eq!(eval_with(&sheet, "=ISNUMBER(B1)"), yes());
        assert_eq!(eval_with(&sheet, "=ISNUMBER(\"5\")"), no());
        assert_eq!(eval_with(&sheet, "=ISTEXT(C1)"), yes());
        assert_eq!(eval_with(&sheet, "=ISLOGICAL(D1)"), yes());
        assert_eq!(eval_with(&sheet, "=ISBLANK(\"\")"), no());
    }

    #[test]
    fn test_error_type() {
        assert_eq!(eval("=ERROR.TYPE(1/0)"), num(2.0));
        assert_eq!(eval("=ERROR.TYPE(NA())"), num(7.0));
        assert_eq!(eval("=ERROR.TYPE(1)"), FormulaValue::error(ErrorKind::NotAvailable));
        assert_eq!(eval("=NA()"), FormulaValue::error(ErrorKind::NotAvailable));
    }
}
