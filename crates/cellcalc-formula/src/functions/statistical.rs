//! Aggregation and conditional aggregation functions

use super::criteria::CriteriaMatcher;
use super::{
    cell, collect_numbers, dims, div_zero, flat, not_available, num_error, number_arg,
    value_error, Collect, FnResult, FunctionCategory::Aggregation, FunctionDef, Param,
};
use crate::value::FormulaValue;
use cellcalc_core::CellError;

const VALUES: &[Param] = &[Param::array("value")];
const NUMBERS: &[Param] = &[Param::array("number")];

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("SUM", Aggregation, 1, None, NUMBERS, fn_sum,
        "Adds its arguments. In ranges only numbers count; direct arguments may be numbers, booleans or numeric text. Errors propagate.").repeating(1),
    FunctionDef::eager("AVERAGE", Aggregation, 1, None, NUMBERS, fn_average,
        "Arithmetic mean of the numbers in its arguments (range text and booleans ignored). #DIV/0! when there are no numbers.").repeating(1),
    FunctionDef::eager("AVERAGEA", Aggregation, 1, None, VALUES, fn_averagea,
        "Mean of its arguments counting range booleans as 1/0 and range text as 0. #DIV/0! when there are no values.").repeating(1),
    FunctionDef::eager("COUNT", Aggregation, 1, None, VALUES, fn_count,
        "Counts numbers in ranges, plus direct arguments that are numbers, booleans or numeric text. Error cells are not counted.").repeating(1),
    FunctionDef::eager("COUNTA", Aggregation, 1, None, VALUES, fn_counta,
        "Counts non-blank values, including text, booleans and error cells.").repeating(1),
    FunctionDef::eager("COUNTBLANK", Aggregation, 1, Some(1), &[Param::array("range")], fn_countblank,
        "Counts blank cells and empty text in a range."),
    FunctionDef::eager("MIN", Aggregation, 1, None, NUMBERS, fn_min,
        "Smallest number in its arguments; 0 when there are no numbers.").repeating(1),
    FunctionDef::eager("MINA", Aggregation, 1, None, VALUES, fn_mina,
        "Smallest value counting range booleans as 1/0 and range text as 0; 0 when empty.").repeating(1),
    FunctionDef::eager("MAX", Aggregation, 1, None, NUMBERS, fn_max,
        "Largest number in its arguments; 0 when there are no numbers.").repeating(1),
    FunctionDef::eager("MAXA", Aggregation, 1, None, VALUES, fn_maxa,
        "Largest value counting range booleans as 1/0 and range text as 0; 0 when empty.").repeating(1),
    FunctionDef::eager("MEDIAN", Aggregation, 1, None, NUMBERS, fn_median,
        "Middle value of the numbers (mean of the two middle values for an even count). #NUM! when there are no numbers.").repeating(1),
    FunctionDef::eager("MODE", Aggregation, 1, None, NUMBERS, fn_mode,
        "Most frequent number; ties go to the value seen first. #N/A when no number repeats.").repeating(1),
    FunctionDef::eager("MODE.SNGL", Aggregation, 1, None, NUMBERS, fn_mode,
        "Most frequent number; ties go to the value seen first. #N/A when no number repeats.").repeating(1),
    FunctionDef::eager("PRODUCT", Aggregation, 1, None, NUMBERS, fn_product,
        "Multiplies the numbers in its arguments; 0 when there are no numbers.").repeating(1),
    FunctionDef::eager("SUMSQ", Aggregation, 1, None, NUMBERS, fn_sumsq,
        "Sum of the squares of the numbers in its arguments.").repeating(1),
    FunctionDef::eager("LARGE", Aggregation, 2, Some(2), &[Param::array("array"), Param::scalar("k")], fn_large,
        "k-th largest number in an array (k rounded up). #NUM! when k < 1 or k exceeds the count."),
    FunctionDef::eager("SMALL", Aggregation, 2, Some(2), &[Param::array("array"), Param::scalar("k")], fn_small,
        "k-th smallest number in an array (k rounded up). #NUM! when k < 1 or k exceeds the count."),
    FunctionDef::eager("STDEV", Aggregation, 1, None, NUMBERS, fn_stdev_s,
        "Sample standard deviation (divides by n-1). #DIV/0! with fewer than two numbers.").repeating(1),
    FunctionDef::eager("STDEV.S", Aggregation, 1, None, NUMBERS, fn_stdev_s,
        "Sample standard deviation (divides by n-1). #DIV/0! with fewer than two numbers.").repeating(1),
    FunctionDef::eager("STDEVA", Aggregation, 1, None, VALUES, fn_stdeva,
        "Sample standard deviation counting range booleans as 1/0 and range text as 0.").repeating(1),
    FunctionDef::eager("STDEV.P", Aggregation, 1, None, NUMBERS, fn_stdev_p,
        "Population standard deviation (divides by n). #DIV/0! when there are no numbers.").repeating(1),
    FunctionDef::eager("STDEVP", Aggregation, 1, None, NUMBERS, fn_stdev_p,
        "Population standard deviation (divides by n). #DIV/0! when there are no numbers.").repeating(1),
    FunctionDef::eager("STDEVPA", Aggregation, 1, None, VALUES, fn_stdevpa,
        "Population standard deviation counting range booleans as 1/0 and range text as 0.").repeating(1),
    FunctionDef::eager("VAR", Aggregation, 1, None, NUMBERS, fn_var_s,
        "Sample variance (divides by n-1). #DIV/0! with fewer than two numbers.").repeating(1),
    FunctionDef::eager("VAR.S", Aggregation, 1, None, NUMBERS, fn_var_s,
        "Sample variance (divides by n-1). #DIV/0! with fewer than two numbers.").repeating(1),
    FunctionDef::eager("VARA", Aggregation, 1, None, VALUES, fn_vara,
        "Sample variance counting range booleans as 1/0 and range text as 0.").repeating(1),
    FunctionDef::eager("VAR.P", Aggregation, 1, None, NUMBERS, fn_var_p,
        "Population variance (divides by n). #DIV/0! when there are no numbers.").repeating(1),
    FunctionDef::eager("VARP", Aggregation, 1, None, NUMBERS, fn_var_p,
        "Population variance (divides by n). #DIV/0! when there are no numbers.").repeating(1),
    FunctionDef::eager("VARPA", Aggregation, 1, None, VALUES, fn_varpa,
        "Population variance counting range booleans as 1/0 and range text as 0.").repeating(1),
    FunctionDef::eager("SUMIF", Aggregation, 2, Some(3),
        &[Param::array("range"), Param::scalar("criteria"), Param::array("sum_range")], fn_sumif,
        "Sums the cells of sum_range (default: range) whose counterpart in range meets the criteria, e.g. \">5\", \"<>0\", \"app*\"."),
    FunctionDef::eager("COUNTIF", Aggregation, 2, Some(2),
        &[Param::array("range"), Param::scalar("criteria")], fn_countif,
        "Counts the cells in range that meet the criteria (number, text with * and ? wildcards, or a comparison such as \">=10\")."),
    FunctionDef::eager("AVERAGEIF", Aggregation, 2, Some(3),
        &[Param::array("range"), Param::scalar("criteria"), Param::array("average_range")], fn_averageif,
        "Mean of the cells of average_range (default: range) whose counterpart in range meets the criteria. #DIV/0! when nothing matches."),
    FunctionDef::eager("SUMIFS", Aggregation, 3, None,
        &[Param::array("sum_range"), Param::array("criteria_range"), Param::scalar("criteria")], fn_sumifs,
        "Sums sum_range where every criteria_range/criteria pair matches. All ranges must have the same shape, otherwise #VALUE!.").repeating(2),
    FunctionDef::eager("COUNTIFS", Aggregation, 2, None,
        &[Param::array("criteria_range"), Param::scalar("criteria")], fn_countifs,
        "Counts positions where every criteria_range/criteria pair matches. All ranges must have the same shape, otherwise #VALUE!.").repeating(2),
    FunctionDef::eager("AVERAGEIFS", Aggregation, 3, None,
        &[Param::array("average_range"), Param::array("criteria_range"), Param::scalar("criteria")], fn_averageifs,
        "Mean of average_range where every criteria_range/criteria pair matches. #DIV/0! when nothing matches.").repeating(2),
];

// === Basic aggregation ===

/// SUM(number1, [number2], ...)
pub fn fn_sum(args: &[FormulaValue]) -> FnResult {
    let numbers = collect_numbers(args, Collect::Numbers)?;
    Ok(FormulaValue::Number(numbers.iter().sum()))
}

fn mean(numbers: &[f64]) -> Result<f64, CellError> {
    if numbers.is_empty() {
        return Err(div_zero());
    }
    Ok(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// AVERAGE(number1, [number2], ...)
pub fn fn_average(args: &[FormulaValue]) -> FnResult {
    mean(&collect_numbers(args, Collect::Numbers)?).map(FormulaValue::Number)
}

pub fn fn_averagea(args: &[FormulaValue]) -> FnResult {
    mean(&collect_numbers(args, Collect::Values)?).map(FormulaValue::Number)
}

/// COUNT(value1, [value2], ...) - error cells are skipped, not propagated
pub fn fn_count(args: &[FormulaValue]) -> FnResult {
    let mut count = 0usize;
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                count += rows
                    .iter()
                    .flatten()
                    .filter(|v| matches!(v, FormulaValue::Number(_)))
                    .count();
            }
            FormulaValue::Number(_) | FormulaValue::Boolean(_) => count += 1,
            FormulaValue::Text(_) if arg.as_number().is_some() => count += 1,
            _ => {}
        }
    }
    Ok(FormulaValue::Number(count as f64))
}

/// COUNTA(value1, [value2], ...) - counts any non-blank value, errors included
pub fn fn_counta(args: &[FormulaValue]) -> FnResult {
    let count = args
        .iter()
        .flat_map(flat)
        .filter(|v| !v.is_blank())
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// COUNTBLANK(range)
pub fn fn_countblank(args: &[FormulaValue]) -> FnResult {
    let count = args
        .iter()
        .flat_map(flat)
        .filter(|v| match v {
            FormulaValue::Blank => true,
            FormulaValue::Text(s) => s.is_empty(),
            _ => false,
        })
        .count();
    Ok(FormulaValue::Number(count as f64))
}

fn extreme(numbers: Vec<f64>, pick: fn(f64, f64) -> f64) -> FnResult {
    Ok(FormulaValue::Number(
        numbers.into_iter().reduce(pick).unwrap_or(0.0),
    ))
}

pub fn fn_min(args: &[FormulaValue]) -> FnResult {
    extreme(collect_numbers(args, Collect::Numbers)?, f64::min)
}

pub fn fn_mina(args: &[FormulaValue]) -> FnResult {
    extreme(collect_numbers(args, Collect::Values)?, f64::min)
}

pub fn fn_max(args: &[FormulaValue]) -> FnResult {
    extreme(collect_numbers(args, Collect::Numbers)?, f64::max)
}

pub fn fn_maxa(args: &[FormulaValue]) -> FnResult {
    extreme(collect_numbers(args, Collect::Values)?, f64::max)
}

/// Sort numbers ascending; inputs are always finite
pub(crate) fn sorted(mut numbers: Vec<f64>) -> Vec<f64> {
    numbers.sort_by(f64::total_cmp);
    numbers
}

/// MEDIAN(number1, [number2], ...)
pub fn fn_median(args: &[FormulaValue]) -> FnResult {
    let numbers = sorted(collect_numbers(args, Collect::Numbers)?);
    let n = numbers.len();
    if n == 0 {
        return Err(num_error("MEDIAN of no numbers"));
    }
    let median = if n % 2 == 0 {
        (numbers[n / 2 - 1] + numbers[n / 2]) / 2.0
    } else {
        numbers[n / 2]
    };
    Ok(FormulaValue::Number(median))
}

/// MODE(number1, [number2], ...)
pub fn fn_mode(args: &[FormulaValue]) -> FnResult {
    let numbers = collect_numbers(args, Collect::Numbers)?;
    let mut best: Option<(f64, usize)> = None;
    for (i, x) in numbers.iter().enumerate() {
        // Counting from the first occurrence keeps ties on the earliest value
        if numbers[..i].contains(x) {
            continue;
        }
        let count = numbers[i..].iter().filter(|y| *y == x).count();
        if count > 1 && best.map_or(true, |(_, c)| count > c) {
            best = Some((*x, count));
        }
    }
    best.map(|(x, _)| FormulaValue::Number(x))
        .ok_or_else(|| not_available("no value repeats"))
}

/// PRODUCT(number1, [number2], ...)
pub fn fn_product(args: &[FormulaValue]) -> FnResult {
    let numbers = collect_numbers(args, Collect::Numbers)?;
    if numbers.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    Ok(FormulaValue::Number(numbers.iter().product()))
}

/// SUMSQ(number1, [number2], ...)
pub fn fn_sumsq(args: &[FormulaValue]) -> FnResult {
    let numbers = collect_numbers(args, Collect::Numbers)?;
    Ok(FormulaValue::Number(numbers.iter().map(|x| x * x).sum()))
}

fn kth(args: &[FormulaValue], largest: bool) -> FnResult {
    let mut numbers = sorted(collect_numbers(&args[..1], Collect::Numbers)?);
    if largest {
        numbers.reverse();
    }
    let k = number_arg(args, 1)?.ceil();
    if k < 1.0 || k > numbers.len() as f64 {
        return Err(num_error(format!("k must be between 1 and {}", numbers.len())));
    }
    Ok(FormulaValue::Number(numbers[k as usize - 1]))
}

/// LARGE(array, k)
pub fn fn_large(args: &[FormulaValue]) -> FnResult {
    kth(args, true)
}

/// SMALL(array, k)
pub fn fn_small(args: &[FormulaValue]) -> FnResult {
    kth(args, false)
}

// === Dispersion ===

/// Sum of squared deviations and the count
fn sum_squared_deviations(numbers: &[f64]) -> (f64, usize) {
    let n = numbers.len();
    if n == 0 {
        return (0.0, 0);
    }
    let mean = numbers.iter().sum::<f64>() / n as f64;
    (numbers.iter().map(|x| (x - mean).powi(2)).sum(), n)
}

pub(crate) fn variance(numbers: &[f64], sample: bool) -> Result<f64, CellError> {
    let (ss, n) = sum_squared_deviations(numbers);
    let denominator = if sample { n.saturating_sub(1) } else { n };
    if denominator == 0 {
        return Err(div_zero());
    }
    Ok(ss / denominator as f64)
}

fn variance_of(args: &[FormulaValue], mode: Collect, sample: bool) -> Result<f64, CellError> {
    variance(&collect_numbers(args, mode)?, sample)
}

pub fn fn_var_s(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Numbers, true).map(FormulaValue::Number)
}

pub fn fn_var_p(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Numbers, false).map(FormulaValue::Number)
}

pub fn fn_vara(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Values, true).map(FormulaValue::Number)
}

pub fn fn_varpa(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Values, false).map(FormulaValue::Number)
}

pub fn fn_stdev_s(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Numbers, true).map(|v| FormulaValue::Number(v.sqrt()))
}

pub fn fn_stdev_p(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Numbers, false).map(|v| FormulaValue::Number(v.sqrt()))
}

pub fn fn_stdeva(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Values, true).map(|v| FormulaValue::Number(v.sqrt()))
}

pub fn fn_stdevpa(args: &[FormulaValue]) -> FnResult {
    variance_of(args, Collect::Values, false).map(|v| FormulaValue::Number(v.sqrt()))
}

// === Conditional aggregation ===

/// Positions (row, col) within `range` whose value meets `criteria`
fn matching_positions(range: &FormulaValue, criteria: &FormulaValue) -> Vec<(usize, usize)> {
    let matcher = CriteriaMatcher::new(criteria);
    let (rows, cols) = dims(range);
    let mut positions = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if cell(range, r, c).map_or(false, |v| matcher.matches(v)) {
                positions.push((r, c));
            }
        }
    }
    positions
}

/// Numbers at the given positions of a target range; errors propagate,
/// positions outside the target are treated as blank
fn numbers_at(target: &FormulaValue, positions: &[(usize, usize)]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();
    for &(r, c) in positions {
        match cell(target, r, c) {
            Some(FormulaValue::Number(n)) => numbers.push(*n),
            Some(FormulaValue::Error(e)) => return Err(e.clone()),
            _ => {}
        }
    }
    Ok(numbers)
}

/// SUMIF(range, criteria, [sum_range])
pub fn fn_sumif(args: &[FormulaValue]) -> FnResult {
    let positions = matching_positions(&args[0], &args[1]);
    let target = args.get(2).unwrap_or(&args[0]);
    Ok(FormulaValue::Number(numbers_at(target, &positions)?.iter().sum()))
}

/// COUNTIF(range, criteria)
pub fn fn_countif(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(
        matching_positions(&args[0], &args[1]).len() as f64,
    ))
}

/// AVERAGEIF(range, criteria, [average_range])
pub fn fn_averageif(args: &[FormulaValue]) -> FnResult {
    let positions = matching_positions(&args[0], &args[1]);
    let target = args.get(2).unwrap_or(&args[0]);
    mean(&numbers_at(target, &positions)?).map(FormulaValue::Number)
}

/// Positions matching every (criteria_range, criteria) pair
fn matching_all(shape: (usize, usize), pairs: &[FormulaValue]) -> Result<Vec<(usize, usize)>, CellError> {
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(value_error("criteria ranges and criteria must come in pairs"));
    }

    let matchers: Vec<(&FormulaValue, CriteriaMatcher)> = pairs
        .chunks(2)
        .map(|pair| (&pair[0], CriteriaMatcher::new(&pair[1])))
        .collect();

    if matchers.iter().any(|(range, _)| dims(range) != shape) {
        return Err(value_error("all ranges must have the same size"));
    }

    let mut positions = Vec::new();
    for r in 0..shape.0 {
        for c in 0..shape.1 {
            let all = matchers.iter().all(|(range, matcher)| {
                cell(range, r, c).map_or(false, |v| matcher.matches(v))
            });
            if all {
                positions.push((r, c));
            }
        }
    }
    Ok(positions)
}

/// SUMIFS(sum_range, criteria_range1, criteria1, ...)
pub fn fn_sumifs(args: &[FormulaValue]) -> FnResult {
    let positions = matching_all(dims(&args[0]), &args[1..])?;
    Ok(FormulaValue::Number(numbers_at(&args[0], &positions)?.iter().sum()))
}

/// COUNTIFS(criteria_range1, criteria1, ...)
pub fn fn_countifs(args: &[FormulaValue]) -> FnResult {
    let positions = matching_all(dims(&args[0]), args)?;
    Ok(FormulaValue::Number(positions.len() as f64))
}

/// AVERAGEIFS(average_range, criteria_range1, criteria1, ...)
pub fn fn_averageifs(args: &[FormulaValue]) -> FnResult {
    let positions = matching_all(dims(&args[0]), &args[1..])?;
    mean(&numbers_at(&args[0], &positions)?).map(FormulaValue::Number)
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
    fn test_sum_argument_rules() {
        assert_eq!(eval("=SUM(1,2,3)"), num(6.0));
        assert_eq!(eval("=SUM(\"3\",TRUE)"), num(4.0));
        assert_eq!(eval("=SUM(\"abc\")"), err(ErrorKind::InvalidValue));

        // In ranges, text and booleans are ignored
        let sheet = grid(&[&["1", "x", "TRUE", ""]]);
        assert_eq!(eval_with(&sheet, "=SUM(A1:D1)"), num(1.0));
        assert_eq!(eval_with(&sheet, "=COUNT(A1:D1)"), num(1.0));
        assert_eq!(eval_with(&sheet, "=COUNTA(A1:D1)"), num(3.0));
        assert_eq!(eval_with(&sheet, "=COUNTBLANK(A1:D1)"), num(1.0));
        assert_eq!(eval_with(&sheet, "=AVERAGEA(A1:D1)"), num(2.0 / 3.0));
        assert_eq!(eval_with(&sheet, "=MAXA(A1:D1)"), num(1.0));
    }

    #[test]
    fn test_errors_in_ranges() {
        let sheet = grid(&[&["1", "#N/A", "3"]]);
        assert_eq!(eval_with(&sheet, "=SUM(A1:C1)"), err(ErrorKind::NotAvailable));
        assert_eq!(eval_with(&sheet, "=COUNT(A1:C1)"), num(2.0));
        assert_eq!(eval_with(&sheet, "=COUNTA(A1:C1)"), num(3.0));
    }

    #[test]
    fn test_average_min_max() {
        assert_eq!(eval("=AVERAGE(2,4,6)"), num(4.0));
        assert_eq!(eval("=AVERAGE(A1:A3)"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("=MIN(5,3,9)"), num(3.0));
        assert_eq!(eval("=MAX(5,3,9)"), num(9.0));
        assert_eq!(eval("=MAX(A1:A3)"), num(0.0));
    }

    #[test]
    fn test_median_mode() {
        assert_eq!(eval("=MEDIAN(3,1,2)"), num(2.0));
        assert_eq!(eval("=MEDIAN(4,1,3,2)"), num(2.5));
        assert_eq!(eval("=MEDIAN(A1:A2)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=MODE(1,2,2,3,3)"), num(2.0));
        assert_eq!(eval("=MODE.SNGL(1,2,3)"), err(ErrorKind::NotAvailable));
    }

    #[test]
    fn test_product_and_sumsq() {
        assert_eq!(eval("=PRODUCT(2,3,4)"), num(24.0));
        assert_eq!(eval("=SUMSQ(3,4)"), num(25.0));
    }

    #[test]
    fn test_large_small() {
        assert_eq!(eval("=LARGE({3,1,4,1,5},2)"), num(4.0));
        assert_eq!(eval("=SMALL({3,1,4,1,5},2)"), num(1.0));
        assert_eq!(eval("=LARGE({1,2},3)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=SMALL({1,2},0)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_variance_and_stdev() {
        assert_eq!(eval("=VAR.S(2,4,4,4,5,5,7,9)"), num(32.0 / 7.0));
        assert_eq!(eval("=VAR.P(2,4,4,4,5,5,7,9)"), num(4.0));
        assert_eq!(eval("=STDEV.P(2,4,4,4,5,5,7,9)"), num(2.0));
        assert_eq!(eval("=STDEV(1)"), err(ErrorKind::DivideByZero));
        assert_eq!(eval("=STDEVP(1)"), num(0.0));
    }

    #[test]
    fn test_conditional_aggregation() {
        let sheet = grid(&[
            &["apple", "10", "east"],
            &["banana", "20", "west"],
            &["apricot", "30", "east"],
            &["cherry", "", "east"],
        ]);
        assert_eq!(eval_with(&sheet, "=SUMIF(A1:A4,\"ap*\",B1:B4)"), num(40.0));
        assert_eq!(eval_with(&sheet, "=SUMIF(B1:B4,\">15\")"), num(50.0));
        assert_eq!(eval_with(&sheet, "=COUNTIF(C1:C4,\"EAST\")"), num(3.0));
        assert_eq!(eval_with(&sheet, "=AVERAGEIF(C1:C4,\"east\",B1:B4)"), num(20.0));
        assert_eq!(
            eval_with(&sheet, "=AVERAGEIF(C1:C4,\"north\",B1:B4)"),
            err(ErrorKind::DivideByZero)
        );
        assert_eq!(
            eval_with(&sheet, "=SUMIFS(B1:B4,C1:C4,\"east\",B1:B4,\">10\")"),
            num(30.0)
        );
        assert_eq!(
            eval_with(&sheet, "=COUNTIFS(C1:C4,\"east\",A1:A4,\"<>cherry\")"),
            num(2.0)
        );
        assert_eq!(
            eval_with(&sheet, "=AVERAGEIFS(B1:B4,C1:C4,\"east\")"),
            num(20.0)
        );
        assert_eq!(
            eval_with(&sheet, "=SUMIFS(B1:B4,C1:C3,\"east\")"),
            err(ErrorKind::InvalidValue)
        );
        assert_eq!(
            eval_with(&sheet, "=SUMIFS(B1:B4,C1:C4)"),
            err(ErrorKind::InvalidValue)
        );
    }
}
