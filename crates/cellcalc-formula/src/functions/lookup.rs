//! Lookup functions

use super::criteria::{has_wildcards, wildcard_match};
use super::{
    dims, int_arg, not_available, opt_bool, opt_int, FnResult, FunctionCategory::Lookup,
    FunctionDef, Param,
};
use crate::error::FormulaResult;
use crate::evaluator::LazyArgs;
use crate::value::{compare_values, FormulaValue};
use cellcalc_core::{CellError, ErrorKind};
use std::cmp::Ordering;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("VLOOKUP", Lookup, 3, Some(4),
        &[Param::scalar("lookup_value"), Param::array("table_array"), Param::scalar("col_index_num"), Param::scalar("range_lookup")],
        fn_vlookup,
        "Searches the first column of table_array for lookup_value and returns the value in the same row from column col_index_num (1-based). \
         range_lookup FALSE finds an exact match (text case-insensitive, * and ? wildcards allowed); TRUE or omitted assumes the first column is sorted ascending and returns the last row not greater than lookup_value. \
         No match is #N/A; col_index_num below 1 is #VALUE!, beyond the table #REF!."),
    FunctionDef::eager("HLOOKUP", Lookup, 3, Some(4),
        &[Param::scalar("lookup_value"), Param::array("table_array"), Param::scalar("row_index_num"), Param::scalar("range_lookup")],
        fn_hlookup,
        "Searches the first row of table_array for lookup_value and returns the value in the same column from row row_index_num (1-based). \
         Matching rules are those of VLOOKUP. No match is #N/A; row_index_num below 1 is #VALUE!, beyond the table #REF!."),
    FunctionDef::eager("INDEX", Lookup, 2, Some(3),
        &[Param::array("array"), Param::scalar("row_num"), Param::scalar("column_num")],
        fn_index,
        "Returns the element of array at row_num and column_num (1-based). For a single-row array a lone index selects the column. \
         0 selects the whole row or column. Negative indexes are #VALUE!; indexes beyond the array are #REF!."),
    FunctionDef::eager("MATCH", Lookup, 2, Some(3),
        &[Param::scalar("lookup_value"), Param::array("lookup_array"), Param::scalar("match_type")],
        fn_match,
        "Returns the 1-based position of lookup_value in a single row or column. match_type 0 finds an exact match (wildcards allowed); \
         1 or omitted finds the largest value not greater than lookup_value in ascending data; -1 finds the smallest value not less than lookup_value in descending data. No match is #N/A."),
    FunctionDef::lazy("CHOOSE", Lookup, 2, None,
        &[Param::scalar("index_num"), Param::lazy("value")],
        fn_choose,
        "Returns the value at position index_num (1-based) among the following arguments; only the chosen argument is evaluated. \
         index_num below 1 or beyond the last value is #VALUE!.").repeating(1),
    FunctionDef::eager("ROWS", Lookup, 1, Some(1), &[Param::array("array")], fn_rows,
        "Number of rows in a range or array; a single value has 1."),
    FunctionDef::eager("COLUMNS", Lookup, 1, Some(1), &[Param::array("array")], fn_columns,
        "Number of columns in a range or array; a single value has 1."),
];

/// Exact-match equality used by VLOOKUP, HLOOKUP and MATCH
///
/// Text compares case-insensitively and may carry wildcards; blank cells
/// never match.
fn values_equal(needle: &FormulaValue, candidate: &FormulaValue) -> bool {
    match (needle, candidate) {
        (FormulaValue::Number(x), FormulaValue::Number(y)) => x == y,
        (FormulaValue::Boolean(x), FormulaValue::Boolean(y)) => x == y,
        (FormulaValue::Text(pattern), FormulaValue::Text(text)) if has_wildcards(pattern) => {
            wildcard_match(pattern, text)
        }
        (FormulaValue::Text(x), FormulaValue::Text(y)) => x.to_lowercase() == y.to_lowercase(),
        _ => false,
    }
}

fn same_type(a: &FormulaValue, b: &FormulaValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Position of the match in `keys`
///
/// Exact mode takes the first equal key. Approximate modes scan sorted keys
/// of the needle's type, ignoring keys of other types, and stop at the first
/// key past the needle.
fn find_position<'a>(
    needle: &FormulaValue,
    keys: impl Iterator<Item = &'a FormulaValue>,
    mode: MatchMode,
) -> Option<usize> {
    let mut best = None;
    for (i, key) in keys.enumerate() {
        match mode {
            MatchMode::Exact => {
                if values_equal(needle, key) {
                    return Some(i);
                }
            }
            MatchMode::NextSmaller | MatchMode::NextLarger => {
                if !same_type(needle, key) {
                    continue;
                }
                let ordering = compare_values(key, needle);
                let within = match mode {
                    MatchMode::NextSmaller => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                if !within {
                    break;
                }
                best = Some(i);
                if ordering == Ordering::Equal {
                    break;
                }
            }
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    Exact,
    /// Largest key not greater than the needle (ascending data)
    NextSmaller,
    /// Smallest key not less than the needle (descending data)
    NextLarger,
}

fn table_rows(value: &FormulaValue) -> Vec<Vec<FormulaValue>> {
    match value {
        FormulaValue::Array(rows) => rows.clone(),
        scalar => vec![vec![scalar.clone()]],
    }
}

/// Index argument of VLOOKUP/HLOOKUP as a 0-based offset bounded by `len`
fn table_offset(args: &[FormulaValue], index: usize, len: usize) -> Result<usize, CellError> {
    let n = int_arg(args, index)?;
    if n < 1.0 {
        return Err(CellError::with_detail(
            ErrorKind::InvalidValue,
            "index must be at least 1",
        ));
    }
    if n > len as f64 {
        return Err(CellError::with_detail(
            ErrorKind::InvalidReference,
            format!("index {} is beyond the table", n),
        ));
    }
    Ok(n as usize - 1)
}

fn lookup_mode(args: &[FormulaValue]) -> Result<MatchMode, CellError> {
    Ok(if opt_bool(args, 3, true)? {
        MatchMode::NextSmaller
    } else {
        MatchMode::Exact
    })
}

/// VLOOKUP(lookup_value, table_array, col_index_num, [range_lookup])
pub fn fn_vlookup(args: &[FormulaValue]) -> FnResult {
    let rows = table_rows(&args[1]);
    let (_, cols) = dims(&args[1]);
    let col = table_offset(args, 2, cols)?;
    let mode = lookup_mode(args)?;

    let keys = rows.iter().filter_map(|row| row.first());
    let row = find_position(&args[0], keys, mode)
        .ok_or_else(|| not_available(format!("{} not found", args[0].as_text())))?;
    Ok(rows[row].get(col).cloned().unwrap_or_default())
}

/// HLOOKUP(lookup_value, table_array, row_index_num, [range_lookup])
pub fn fn_hlookup(args: &[FormulaValue]) -> FnResult {
    let rows = table_rows(&args[1]);
    let (height, _) = dims(&args[1]);
    let row = table_offset(args, 2, height)?;
    let mode = lookup_mode(args)?;

    let keys = rows.first().map(|r| r.iter()).into_iter().flatten();
    let col = find_position(&args[0], keys, mode)
        .ok_or_else(|| not_available(format!("{} not found", args[0].as_text())))?;
    Ok(rows[row].get(col).cloned().unwrap_or_default())
}

/// INDEX(array, row_num, [column_num])
pub fn fn_index(args: &[FormulaValue]) -> FnResult {
    let rows = table_rows(&args[0]);
    let (height, width) = dims(&args[0]);
    if height == 0 || width == 0 {
        return Err(CellError::new(ErrorKind::InvalidReference));
    }

    let mut row_num = int_arg(args, 1)?;
    let mut col_num = opt_int(args, 2, 0.0)?;
    // A lone index into a single row selects the column
    if args.len() < 3 && height == 1 && width > 1 {
        col_num = row_num;
        row_num = 1.0;
    } else if args.len() < 3 {
        col_num = 1.0;
        if width > 1 {
            col_num = 0.0;
        }
    }

    if row_num < 0.0 || col_num < 0.0 {
        return Err(CellError::with_detail(
            ErrorKind::InvalidValue,
            "index must not be negative",
        ));
    }
    if row_num > height as f64 || col_num > width as f64 {
        return Err(CellError::with_detail(
            ErrorKind::InvalidReference,
            "index is beyond the array",
        ));
    }

    let (r, c) = (row_num as usize, col_num as usize);
    let result = match (r, c) {
        (0, 0) => FormulaValue::Array(rows),
        (0, c) => FormulaValue::Array(rows.iter().map(|row| vec![row[c - 1].clone()]).collect()),
        (r, 0) => FormulaValue::Array(vec![rows[r - 1].clone()]),
        (r, c) => rows[r - 1][c - 1].clone(),
    };
    Ok(result)
}

/// MATCH(lookup_value, lookup_array, [match_type])
pub fn fn_match(args: &[FormulaValue]) -> FnResult {
    let rows = table_rows(&args[1]);
    let (height, width) = dims(&args[1]);
    if height > 1 && width > 1 {
        return Err(not_available("lookup_array must be a single row or column"));
    }

    let match_type = opt_int(args, 2, 1.0)?;
    let mode = match match_type {
        t if t > 0.0 => MatchMode::NextSmaller,
        t if t < 0.0 => MatchMode::NextLarger,
        _ => MatchMode::Exact,
    };

    let position = find_position(&args[0], rows.iter().flatten(), mode)
        .ok_or_else(|| not_available(format!("{} not found", args[0].as_text())))?;
    Ok(FormulaValue::Number((position + 1) as f64))
}

/// CHOOSE(index_num, value1, [value2], ...)
pub fn fn_choose(args: &LazyArgs<'_>) -> FormulaResult<FormulaValue> {
    let index = match args.value(0)? {
        FormulaValue::Error(e) => return Ok(FormulaValue::Error(e)),
        value => match value.to_number() {
            Ok(n) => n.trunc(),
            Err(e) => return Ok(FormulaValue::Error(e)),
        },
    };

    let choices = args.len() - 1;
    if index < 1.0 || index > choices as f64 {
        return Ok(FormulaValue::Error(CellError::with_detail(
            ErrorKind::InvalidValue,
            format!("index_num must be between 1 and {}", choices),
        )));
    }
    args.result(index as usize)
}

/// ROWS(array)
pub fn fn_rows(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(dims(&args[0]).0 as f64))
}

/// COLUMNS(array)
pub fn fn_columns(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(dims(&args[0]).1 as f64))
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
    fn test_vlookup_exact_and_miss() {
        let sheet = grid(&[&["a", "1"], &["b", "2"]]);
        assert_eq!(eval_with(&sheet, "=VLOOKUP(\"b\",A1:B2,2,FALSE)"), num(2.0));
        assert_eq!(eval_with(&sheet, "=VLOOKUP(\"B\",A1:B2,2,FALSE)"), num(2.0));
        assert_eq!(
            eval_with(&sheet, "=VLOOKUP(\"z\",A1:B2,2,FALSE)"),
            err(ErrorKind::NotAvailable)
        );
        assert_eq!(eval_with(&sheet, "=VLOOKUP(\"?\",A1:B2,2,FALSE)"), num(1.0));
    }

    #[test]
    fn test_vlookup_column_bounds() {
        let sheet = grid(&[&["a", "1"], &["b", "2"]]);
        assert_eq!(
            eval_with(&sheet, "=VLOOKUP(\"a\",A1:B2,3,FALSE)"),
            err(ErrorKind::InvalidReference)
        );
        assert_eq!(
            eval_with(&sheet, "=VLOOKUP(\"a\",A1:B2,0,FALSE)"),
            err(ErrorKind::InvalidValue)
        );
    }

    #[test]
    fn test_vlookup_approximate() {
        let sheet = grid(&[&["0", "F"], &["60", "D"], &["70", "C"], &["80", "B"], &["90", "A"]]);
        assert_eq!(eval_with(&sheet, "=VLOOKUP(75,A1:B5,2)"), FormulaValue::text("C"));
        assert_eq!(eval_with(&sheet, "=VLOOKUP(90,A1:B5,2,TRUE)"), FormulaValue::text("A"));
        assert_eq!(eval_with(&sheet, "=VLOOKUP(-1,A1:B5,2)"), err(ErrorKind::NotAvailable));
    }

    #[test]
    fn test_hlookup() {
        assert_eq!(eval("=HLOOKUP(\"b\",{\"a\",\"b\";1,2},2,FALSE)"), num(2.0));
        assert_eq!(
            eval("=HLOOKUP(\"c\",{\"a\",\"b\";1,2},2,FALSE)"),
            err(ErrorKind::NotAvailable)
        );
    }

    #[test]
    fn test_index() {
        assert_eq!(eval("=INDEX({1,2;3,4},2,1)"), num(3.0));
        assert_eq!(eval("=INDEX({1,2,3},2)"), num(2.0));
        assert_eq!(eval("=INDEX({1;2;3},3)"), num(3.0));
        assert_eq!(eval("=INDEX({1,2;3,4},3,1)"), err(ErrorKind::InvalidReference));
        assert_eq!(eval("=INDEX({1,2;3,4},-1,1)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=SUM(INDEX({1,2;3,4},0,2))"), num(6.0));
    }

    #[test]
    fn test_match() {
        assert_eq!(eval("=MATCH(3,{1,3,5},0)"), num(2.0));
        assert_eq!(eval("=MATCH(4,{1,3,5})"), num(2.0));
        assert_eq!(eval("=MATCH(4,{5,3,1},-1)"), num(1.0));
        assert_eq!(eval("=MATCH(\"b*\",{\"apple\",\"banana\"},0)"), num(2.0));
        assert_eq!(eval("=MATCH(9,{1,3,5},0)"), err(ErrorKind::NotAvailable));
    }

    #[test]
    fn test_choose_is_lazy() {
        assert_eq!(eval("=CHOOSE(2,1/0,\"two\")"), FormulaValue::text("two"));
        assert_eq!(eval("=CHOOSE(3,1,2)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_rows_columns() {
        assert_eq!(eval("=ROWS(A1:C4)"), num(4.0));
        assert_eq!(eval("=COLUMNS(A1:C4)"), num(3.0));
        assert_eq!(eval("=ROWS(5)"), num(1.0));
    }
}
