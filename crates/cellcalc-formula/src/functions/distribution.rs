//! Distributions, percentiles and linear regression
//!
//! Densities and quantiles come from `statrs`; percentiles interpolate
//! linearly between ranks.

use super::statistical::sorted;
use super::{
    array_numbers, bool_arg, div_zero, flat, int_arg, not_available, num_error, number_arg,
    opt_bool, value_error, FnResult, FunctionCategory::Statistical, FunctionDef, Param,
};
use crate::value::FormulaValue;
use cellcalc_core::{CellError, ErrorKind};
use statrs::distribution::{Binomial, Continuous, ContinuousCDF, Discrete, DiscreteCDF, Normal};

const NORMAL: &[Param] = &[
    Param::scalar("x"),
    Param::scalar("mean"),
    Param::scalar("standard_dev"),
    Param::scalar("cumulative"),
];
const NORMAL_INV: &[Param] = &[
    Param::scalar("probability"),
    Param::scalar("mean"),
    Param::scalar("standard_dev"),
];
const BINOMIAL: &[Param] = &[
    Param::scalar("number_s"),
    Param::scalar("trials"),
    Param::scalar("probability_s"),
    Param::scalar("cumulative"),
];
const PERCENTILE: &[Param] = &[Param::array("array"), Param::scalar("k")];
const QUARTILE: &[Param] = &[Param::array("array"), Param::scalar("quart")];
const PAIRED: &[Param] = &[Param::array("array1"), Param::array("array2")];
const REGRESSION: &[Param] = &[Param::array("known_y's"), Param::array("known_x's")];
const FORECAST: &[Param] = &[
    Param::scalar("x"),
    Param::array("known_y's"),
    Param::array("known_x's"),
];

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("NORM.DIST", Statistical, 4, Some(4), NORMAL, fn_norm_dist,
        "Normal distribution at x with the given mean and standard_dev: the cumulative probability when cumulative is TRUE, else the density. \
         #NUM! when standard_dev <= 0."),
    FunctionDef::eager("NORMDIST", Statistical, 4, Some(4), NORMAL, fn_norm_dist,
        "Legacy name of NORM.DIST."),
    FunctionDef::eager("NORM.S.DIST", Statistical, 2, Some(2), &[Param::scalar("z"), Param::scalar("cumulative")], fn_norm_s_dist,
        "Standard normal distribution at z: cumulative probability when cumulative is TRUE, else the density."),
    FunctionDef::eager("NORMSDIST", Statistical, 1, Some(1), &[Param::scalar("z")], fn_normsdist,
        "Cumulative standard normal distribution at z."),
    FunctionDef::eager("NORM.INV", Statistical, 3, Some(3), NORMAL_INV, fn_norm_inv,
        "Inverse of the cumulative normal distribution. #NUM! when probability is outside (0, 1) or standard_dev <= 0."),
    FunctionDef::eager("NORMINV", Statistical, 3, Some(3), NORMAL_INV, fn_norm_inv,
        "Legacy name of NORM.INV."),
    FunctionDef::eager("BINOM.DIST", Statistical, 4, Some(4), BINOMIAL, fn_binom_dist,
        "Binomial probability of number_s successes in trials (both truncated) with success probability probability_s; cumulative when TRUE. \
         #NUM! when number_s is outside 0..trials or probability_s is outside 0..1."),
    FunctionDef::eager("BINOMDIST", Statistical, 4, Some(4), BINOMIAL, fn_binom_dist,
        "Legacy name of BINOM.DIST."),
    FunctionDef::eager("PERCENTILE.INC", Statistical, 2, Some(2), PERCENTILE, fn_percentile_inc,
        "k-th percentile of the numbers in array, k in 0..1 inclusive, interpolating between ranks. #NUM! for k outside 0..1 or no numbers."),
    FunctionDef::eager("PERCENTILE", Statistical, 2, Some(2), PERCENTILE, fn_percentile_inc,
        "Legacy name of PERCENTILE.INC."),
    FunctionDef::eager("PERCENTILE.EXC", Statistical, 2, Some(2), PERCENTILE, fn_percentile_exc,
        "k-th percentile of the numbers in array, k strictly between 0 and 1, using rank k*(n+1). #NUM! when the rank falls outside the data."),
    FunctionDef::eager("QUARTILE.INC", Statistical, 2, Some(2), QUARTILE, fn_quartile_inc,
        "Quartile quart (0-4, truncated) of the numbers in array, as PERCENTILE.INC(array, quart/4). #NUM! for other quart values."),
    FunctionDef::eager("QUARTILE", Statistical, 2, Some(2), QUARTILE, fn_quartile_inc,
        "Legacy name of QUARTILE.INC."),
    FunctionDef::eager("QUARTILE.EXC", Statistical, 2, Some(2), QUARTILE, fn_quartile_exc,
        "Quartile quart (1-3, truncated) of the numbers in array, as PERCENTILE.EXC(array, quart/4)."),
    FunctionDef::eager("CORREL", Statistical, 2, Some(2), PAIRED, fn_correl,
        "Pearson correlation coefficient of two equally-sized arrays, using positions where both hold numbers. \
         #N/A when the sizes differ; #DIV/0! when either side has no variance."),
    FunctionDef::eager("PEARSON", Statistical, 2, Some(2), PAIRED, fn_correl,
        "Same as CORREL."),
    FunctionDef::eager("SLOPE", Statistical, 2, Some(2), REGRESSION, fn_slope,
        "Slope of the least-squares line through the (known_x, known_y) pairs. #N/A when the sizes differ; #DIV/0! when the x values do not vary."),
    FunctionDef::eager("INTERCEPT", Statistical, 2, Some(2), REGRESSION, fn_intercept,
        "y-intercept of the least-squares line through the (known_x, known_y) pairs."),
    FunctionDef::eager("RSQ", Statistical, 2, Some(2), REGRESSION, fn_rsq,
        "Square of the Pearson correlation of the (known_x, known_y) pairs."),
    FunctionDef::eager("FORECAST.LINEAR", Statistical, 3, Some(3), FORECAST, fn_forecast,
        "Value at x of the least-squares line through the (known_x, known_y) pairs."),
    FunctionDef::eager("FORECAST", Statistical, 3, Some(3), FORECAST, fn_forecast,
        "Legacy name of FORECAST.LINEAR."),
    FunctionDef::eager("LINEST", Statistical, 1, Some(4),
        &[Param::array("known_y's"), Param::array("known_x's"), Param::scalar("const"), Param::scalar("stats")],
        fn_linest,
        "Simple linear regression of known_y's on known_x's (default 1, 2, 3, ...). Returns {slope, intercept}; with const FALSE the line passes through the origin. \
         With stats TRUE returns a 5x2 array adding standard errors, r-squared and the standard error of y, the F statistic and degrees of freedom, \
         and the regression and residual sums of squares."),
];

fn normal(mean: f64, sd: f64) -> Result<Normal, CellError> {
    if sd <= 0.0 {
        return Err(num_error("standard_dev must be positive"));
    }
    Normal::new(mean, sd).map_err(|e| num_error(e.to_string()))
}

fn probability(p: f64) -> Result<f64, CellError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(num_error("probability must be between 0 and 1"));
    }
    Ok(p)
}

/// NORM.DIST(x, mean, standard_dev, cumulative)
pub fn fn_norm_dist(args: &[FormulaValue]) -> FnResult {
    let x = number_arg(args, 0)?;
    let dist = normal(number_arg(args, 1)?, number_arg(args, 2)?)?;
    let value = if bool_arg(args, 3)? {
        dist.cdf(x)
    } else {
        dist.pdf(x)
    };
    Ok(FormulaValue::Number(value))
}

/// NORM.S.DIST(z, cumulative)
pub fn fn_norm_s_dist(args: &[FormulaValue]) -> FnResult {
    let z = number_arg(args, 0)?;
    let dist = normal(0.0, 1.0)?;
    let value = if bool_arg(args, 1)? {
        dist.cdf(z)
    } else {
        dist.pdf(z)
    };
    Ok(FormulaValue::Number(value))
}

/// NORMSDIST(z)
pub fn fn_normsdist(args: &[FormulaValue]) -> FnResult {
    let z = number_arg(args, 0)?;
    Ok(FormulaValue::Number(normal(0.0, 1.0)?.cdf(z)))
}

/// NORM.INV(probability, mean, standard_dev)
pub fn fn_norm_inv(args: &[FormulaValue]) -> FnResult {
    let p = number_arg(args, 0)?;
    if p <= 0.0 || p >= 1.0 {
        return Err(num_error("probability must be strictly between 0 and 1"));
    }
    let dist = normal(number_arg(args, 1)?, number_arg(args, 2)?)?;
    Ok(FormulaValue::Number(dist.inverse_cdf(p)))
}

/// BINOM.DIST(number_s, trials, probability_s, cumulative)
pub fn fn_binom_dist(args: &[FormulaValue]) -> FnResult {
    let successes = int_arg(args, 0)?;
    let trials = int_arg(args, 1)?;
    let p = probability(number_arg(args, 2)?)?;
    let cumulative = bool_arg(args, 3)?;
    if successes < 0.0 || trials < 0.0 || successes > trials {
        return Err(num_error("number_s must be between 0 and trials"));
    }

    let dist = Binomial::new(p, trials as u64).map_err(|e| num_error(e.to_string()))?;
    let k = successes as u64;
    let value = if cumulative { dist.cdf(k) } else { dist.pmf(k) };
    Ok(FormulaValue::Number(value))
}

/// Sorted numbers of an array argument; `#NUM!` when there are none
fn sorted_numbers(value: &FormulaValue) -> Result<Vec<f64>, CellError> {
    let numbers = sorted(array_numbers(value)?);
    if numbers.is_empty() {
        return Err(num_error("no numbers"));
    }
    Ok(numbers)
}

/// Value at a 0-based fractional rank, interpolating between neighbours
fn at_rank(numbers: &[f64], rank: f64) -> f64 {
    let lower = rank.floor() as usize;
    let fraction = rank - rank.floor();
    match numbers.get(lower + 1) {
        Some(upper) if fraction > 0.0 => numbers[lower] + fraction * (upper - numbers[lower]),
        _ => numbers[lower],
    }
}

fn percentile_inc(numbers: &[f64], k: f64) -> Result<f64, CellError> {
    if !(0.0..=1.0).contains(&k) {
        return Err(num_error("k must be between 0 and 1"));
    }
    Ok(at_rank(numbers, k * (numbers.len() - 1) as f64))
}

fn percentile_exc(numbers: &[f64], k: f64) -> Result<f64, CellError> {
    let rank = k * (numbers.len() + 1) as f64 - 1.0;
    if k <= 0.0 || k >= 1.0 || rank < 0.0 || rank > (numbers.len() - 1) as f64 {
        return Err(num_error("k is outside the range the data supports"));
    }
    Ok(at_rank(numbers, rank))
}

/// PERCENTILE.INC(array, k)
pub fn fn_percentile_inc(args: &[FormulaValue]) -> FnResult {
    let numbers = sorted_numbers(&args[0])?;
    let k = number_arg(args, 1)?;
    percentile_inc(&numbers, k).map(FormulaValue::Number)
}

/// PERCENTILE.EXC(array, k)
pub fn fn_percentile_exc(args: &[FormulaValue]) -> FnResult {
    let numbers = sorted_numbers(&args[0])?;
    let k = number_arg(args, 1)?;
    percentile_exc(&numbers, k).map(FormulaValue::Number)
}

/// QUARTILE.INC(array, quart)
pub fn fn_quartile_inc(args: &[FormulaValue]) -> FnResult {
    let numbers = sorted_numbers(&args[0])?;
    let quart = int_arg(args, 1)?;
    if !(0.0..=4.0).contains(&quart) {
        return Err(num_error("quart must be between 0 and 4"));
    }
    percentile_inc(&numbers, quart / 4.0).map(FormulaValue::Number)
}

/// QUARTILE.EXC(array, quart)
pub fn fn_quartile_exc(args: &[FormulaValue]) -> FnResult {
    let numbers = sorted_numbers(&args[0])?;
    let quart = int_arg(args, 1)?;
    if !(1.0..=3.0).contains(&quart) {
        return Err(num_error("quart must be between 1 and 3"));
    }
    percentile_exc(&numbers, quart / 4.0).map(FormulaValue::Number)
}

/// (x, y) pairs where both sides hold numbers
///
/// The arrays must have the same number of elements; errors in either
/// propagate.
fn pairs(xs: &FormulaValue, ys: &FormulaValue) -> Result<Vec<(f64, f64)>, CellError> {
    let xs = flat(xs);
    let ys = flat(ys);
    if xs.len() != ys.len() {
        return Err(not_available("arrays have different sizes"));
    }

    let mut pairs = Vec::with_capacity(xs.len());
    for (x, y) in xs.into_iter().zip(ys) {
        match (x, y) {
            (FormulaValue::Error(e), _) | (_, FormulaValue::Error(e)) => return Err(e.clone()),
            (FormulaValue::Number(x), FormulaValue::Number(y)) => pairs.push((*x, *y)),
            _ => {}
        }
    }
    Ok(pairs)
}

/// Sums of squares and cross products about the means
struct Moments {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl Moments {
    fn of(pairs: &[(f64, f64)]) -> Result<Self, CellError> {
        if pairs.is_empty() {
            return Err(div_zero());
        }
        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut moments = Self {
            mean_x,
            mean_y,
            sxx: 0.0,
            syy: 0.0,
            sxy: 0.0,
        };
        for (x, y) in pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            moments.sxx += dx * dx;
            moments.syy += dy * dy;
            moments.sxy += dx * dy;
        }
        Ok(moments)
    }

    fn slope(&self) -> Result<f64, CellError> {
        if self.sxx == 0.0 {
            return Err(div_zero());
        }
        Ok(self.sxy / self.sxx)
    }

    fn intercept(&self) -> Result<f64, CellError> {
        Ok(self.mean_y - self.slope()? * self.mean_x)
    }

    fn correlation(&self) -> Result<f64, CellError> {
        let denominator = (self.sxx * self.syy).sqrt();
        if denominator == 0.0 {
            return Err(div_zero());
        }
        Ok(self.sxy / denominator)
    }
}

/// Regression moments with y in the first argument and x in the second
fn regression(args: &[FormulaValue], y: usize, x: usize) -> Result<Moments, CellError> {
    Moments::of(&pairs(&args[x], &args[y])?)
}

/// CORREL(array1, array2)
pub fn fn_correl(args: &[FormulaValue]) -> FnResult {
    regression(args, 1, 0)?
        .correlation()
        .map(FormulaValue::Number)
}

/// SLOPE(known_y's, known_x's)
pub fn fn_slope(args: &[FormulaValue]) -> FnResult {
    regression(args, 0, 1)?.slope().map(FormulaValue::Number)
}

/// INTERCEPT(known_y's, known_x's)
pub fn fn_intercept(args: &[FormulaValue]) -> FnResult {
    regression(args, 0, 1)?
        .intercept()
        .map(FormulaValue::Number)
}

/// RSQ(known_y's, known_x's)
pub fn fn_rsq(args: &[FormulaValue]) -> FnResult {
    let r = regression(args, 0, 1)?.correlation()?;
    Ok(FormulaValue::Number(r * r))
}

/// FORECAST.LINEAR(x, known_y's, known_x's)
pub fn fn_forecast(args: &[FormulaValue]) -> FnResult {
    let x = number_arg(args, 0)?;
    let moments = regression(args, 1, 2)?;
    Ok(FormulaValue::Number(moments.intercept()? + moments.slope()? * x))
}

/// Every element of a LINEST input as a number; text and blanks are `#VALUE!`
fn all_numbers(value: &FormulaValue) -> Result<Vec<f64>, CellError> {
    flat(value)
        .into_iter()
        .map(|v| match v {
            FormulaValue::Number(n) => Ok(*n),
            FormulaValue::Error(e) => Err(e.clone()),
            other => Err(value_error(format!(
                "LINEST needs numbers, found {}",
                other.type_name()
            ))),
        })
        .collect()
}

/// Array cell for a statistic, `#NUM!` when it is not finite
fn stat(value: f64) -> FormulaValue {
    if value.is_finite() {
        FormulaValue::Number(value)
    } else {
        FormulaValue::error(ErrorKind::NumericError)
    }
}

/// LINEST(known_y's, [known_x's], [const], [stats])
pub fn fn_linest(args: &[FormulaValue]) -> FnResult {
    let ys = all_numbers(&args[0])?;
    let xs = match args.get(1) {
        None | Some(FormulaValue::Blank) => (1..=ys.len()).map(|i| i as f64).collect(),
        Some(value) => all_numbers(value)?,
    };
    let with_const = opt_bool(args, 2, true)?;
    let with_stats = opt_bool(args, 3, false)?;

    if xs.len() != ys.len() {
        return Err(CellError::with_detail(
            ErrorKind::InvalidReference,
            "known_y's and known_x's have different sizes",
        ));
    }
    if ys.is_empty() {
        return Err(value_error("no data"));
    }

    let pairs: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
    let n = pairs.len() as f64;

    // Fit, total sum of squares and the x spread used for the slope's error
    let (slope, intercept, ss_total, x_spread, mean_x) = if with_const {
        let m = Moments::of(&pairs)?;
        (m.slope()?, m.intercept()?, m.syy, m.sxx, m.mean_x)
    } else {
        let sxx: f64 = pairs.iter().map(|(x, _)| x * x).sum();
        if sxx == 0.0 {
            return Err(div_zero());
        }
        let sxy: f64 = pairs.iter().map(|(x, y)| x * y).sum();
        let syy: f64 = pairs.iter().map(|(_, y)| y * y).sum();
        (sxy / sxx, 0.0, syy, sxx, 0.0)
    };

    if !with_stats {
        return Ok(FormulaValue::Array(vec![vec![
            FormulaValue::Number(slope),
            FormulaValue::Number(intercept),
        ]]));
    }

    let ss_resid: f64 = pairs
        .iter()
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum();
    let ss_reg = ss_total - ss_resid;
    let df = if with_const { n - 2.0 } else { n - 1.0 };

    let se_y = (ss_resid / df).sqrt();
    let se_slope = se_y / x_spread.sqrt();
    let se_intercept = if with_const {
        stat(se_y * (1.0 / n + mean_x * mean_x / x_spread).sqrt())
    } else {
        FormulaValue::error(ErrorKind::NotAvailable)
    };
    let r_squared = if ss_total == 0.0 { 1.0 } else { ss_reg / ss_total };
    let f_stat = ss_reg / (ss_resid / df);

    Ok(FormulaValue::Array(vec![
        vec![FormulaValue::Number(slope), FormulaValue::Number(intercept)],
        vec![stat(se_slope), se_intercept],
        vec![stat(r_squared), stat(se_y)],
        vec![stat(f_stat), FormulaValue::Number(df)],
        vec![stat(ss_reg), stat(ss_resid)],
    ]))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{approx, eval, eval_with, grid, num};
    use crate::FormulaValue;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    fn rows(value: FormulaValue) -> Vec<Vec<FormulaValue>> {
        match value {
            FormulaValue::Array(rows) => rows,
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn test_normal_distribution() {
        approx(&eval("=NORM.DIST(42,40,1.5,TRUE)"), 0.9087887802741321);
        approx(&eval("=NORMDIST(42,40,1.5,FALSE)"), 0.10934004978399575);
        approx(&eval("=NORM.S.DIST(1,TRUE)"), 0.8413447460685429);
        approx(&eval("=NORMSDIST(0)"), 0.5);
        approx(&eval("=NORM.INV(0.9087887802741321,40,1.5)"), 42.0);
        assert_eq!(eval("=NORM.DIST(1,0,0,TRUE)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=NORM.INV(1,0,1)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_binomial_distribution() {
        approx(&eval("=BINOM.DIST(6,10,0.5,FALSE)"), 0.205078125);
        approx(&eval("=BINOMDIST(6,10,0.5,TRUE)"), 0.828125);
        assert_eq!(eval("=BINOM.DIST(11,10,0.5,TRUE)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=BINOM.DIST(1,10,1.5,TRUE)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_percentiles_and_quartiles() {
        approx(&eval("=PERCENTILE({1,2,3,4},0.3)"), 1.9);
        approx(&eval("=PERCENTILE.EXC({1,2,3,4},0.25)"), 1.25);
        assert_eq!(eval("=PERCENTILE.EXC({1,2,3,4},0.1)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=PERCENTILE({1,2},1.5)"), err(ErrorKind::NumericError));
        approx(&eval("=QUARTILE({1,2,4,7,8,9,10,12},1)"), 3.5);
        approx(&eval("=QUARTILE.EXC({1,2,4,7,8,9,10,12},1)"), 2.5);
        assert_eq!(eval("=QUARTILE({1,2},5)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_correlation_and_regression() {
        approx(&eval("=CORREL({3,2,4,5,6},{9,7,12,15,17})"), 0.9970544855015815);
        approx(&eval("=PEARSON({3,2,4,5,6},{9,7,12,15,17})"), 0.9970544855015815);
        approx(&eval("=SLOPE({2,3,9,1,8,7,5},{6,5,11,7,5,4,4})"), 0.3055555555555556);
        approx(&eval("=INTERCEPT({2,3,9,1,8,7,5},{6,5,11,7,5,4,4})"), 3.1666666666666665);
        approx(&eval("=RSQ({2,3,9,1,8,7,5},{6,5,11,7,5,4,4})"), 0.05795019157088123);
        approx(&eval("=FORECAST(30,{6,7,9,15,21},{20,28,31,38,40})"), 10.607253086419755);
        assert_eq!(eval("=SLOPE({1,2,3},{1,2})"), err(ErrorKind::NotAvailable));
        assert_eq!(eval("=SLOPE({1,2,3},{5,5,5})"), err(ErrorKind::DivideByZero));
    }

    #[test]
    fn test_regression_skips_non_numeric_pairs() {
        let sheet = grid(&[&["1", "2"], &["x", "9"], &["3", "6"]]);
        assert_eq!(eval_with(&sheet, "=SLOPE(B1:B3,A1:A3)"), num(2.0));
    }

    #[test]
    fn test_linest() {
        let fit = rows(eval("=LINEST({1,9,5,8},{0,4,2,3})"));
        assert_eq!(fit.len(), 1);
        approx(&fit[0][0], 2.085714285714286);
        approx(&fit[0][1], 1.057142857142857);

        let origin = rows(eval("=LINEST({1,9,5,8},{0,4,2,3},FALSE)"));
        approx(&origin[0][0], 2.413793103448276);
        assert_eq!(origin[0][1], num(0.0));

        let stats = rows(eval("=LINEST({1,9,5,8},{0,4,2,3},TRUE,TRUE)"));
        assert_eq!(stats.len(), 5);
        approx(&stats[1][0], 0.1979486637221573);
        approx(&stats[1][1], 0.532993088747932);
        approx(&stats[2][0], 0.9823041474654378);
        approx(&stats[2][1], 0.5855400437691196);
        approx(&stats[3][0], 111.02083333333344);
        assert_eq!(stats[3][1], num(2.0));
        approx(&stats[4][0], 38.06428571428572);
        approx(&stats[4][1], 0.685714285714285);

        let implicit_x = rows(eval("=LINEST({3,5,7})"));
        approx(&implicit_x[0][0], 2.0);
        approx(&implicit_x[0][1], 1.0);
    }
}
