//! Financial functions
//!
//! Sign convention: money paid out is negative, money received positive.
//! `type` 0 means payments at the end of each period, 1 at the beginning.

use super::{
    array_numbers, collect_numbers, div_zero, num_error, number_arg, opt_int, opt_number, Collect,
    FnResult, FunctionCategory::Financial, FunctionDef, Param,
};
use crate::value::FormulaValue;
use cellcalc_core::CellError;
use tracing::warn;

/// Iteration cap for IRR and RATE
pub const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance on the change in rate between iterations
pub const ITERATION_TOLERANCE: f64 = 1e-10;

const DEFAULT_GUESS: f64 = 0.1;

/// Largest period CUMIPMT, CUMPRINC, DB and DDB step through one at a time
pub const MAX_PERIODS: f64 = 1_000_000.0;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("PMT", Financial, 3, Some(5),
        &[Param::scalar("rate"), Param::scalar("nper"), Param::scalar("pv"), Param::scalar("fv"), Param::scalar("type")],
        fn_pmt,
        "Payment per period for a loan or annuity with constant payments and a constant rate. fv defaults to 0, type to 0 (end of period). #NUM! when nper is 0."),
    FunctionDef::eager("IPMT", Financial, 4, Some(6),
        &[Param::scalar("rate"), Param::scalar("per"), Param::scalar("nper"), Param::scalar("pv"), Param::scalar("fv"), Param::scalar("type")],
        fn_ipmt,
        "Interest part of the payment for period per (1-based) of a constant-payment loan. #NUM! when per is outside 1..nper."),
    FunctionDef::eager("PPMT", Financial, 4, Some(6),
        &[Param::scalar("rate"), Param::scalar("per"), Param::scalar("nper"), Param::scalar("pv"), Param::scalar("fv"), Param::scalar("type")],
        fn_ppmt,
        "Principal part of the payment for period per (1-based): PMT minus IPMT. #NUM! when per is outside 1..nper."),
    FunctionDef::eager("FV", Financial, 3, Some(5),
        &[Param::scalar("rate"), Param::scalar("nper"), Param::scalar("pmt"), Param::scalar("pv"), Param::scalar("type")],
        fn_fv,
        "Future value of an investment with periodic constant payments and a constant rate. pv defaults to 0, type to 0."),
    FunctionDef::eager("PV", Financial, 3, Some(5),
        &[Param::scalar("rate"), Param::scalar("nper"), Param::scalar("pmt"), Param::scalar("fv"), Param::scalar("type")],
        fn_pv,
        "Present value of a series of constant future payments. fv defaults to 0, type to 0."),
    FunctionDef::eager("NPER", Financial, 3, Some(5),
        &[Param::scalar("rate"), Param::scalar("pmt"), Param::scalar("pv"), Param::scalar("fv"), Param::scalar("type")],
        fn_nper,
        "Number of periods needed to reach fv from pv with constant payments pmt. #NUM! when no number of periods can do it."),
    FunctionDef::eager("NPV", Financial, 2, None,
        &[Param::scalar("rate"), Param::array("value")],
        fn_npv,
        "Net present value of cash flows at the end of periods 1, 2, ... discounted at rate. Text and booleans in ranges are ignored. #DIV/0! when rate is -1.").repeating(1),
    FunctionDef::eager("IRR", Financial, 1, Some(2),
        &[Param::array("values"), Param::scalar("guess")],
        fn_irr,
        "Internal rate of return of periodic cash flows, found with Newton's method from guess (default 0.1), at most 100 iterations, tolerance 1e-10. \
         #NUM! when the flows do not change sign or the iteration does not converge."),
    FunctionDef::eager("RATE", Financial, 3, Some(6),
        &[Param::scalar("nper"), Param::scalar("pmt"), Param::scalar("pv"), Param::scalar("fv"), Param::scalar("type"), Param::scalar("guess")],
        fn_rate,
        "Interest rate per period of an annuity, found with Newton's method from guess (default 0.1), at most 100 iterations, tolerance 1e-10. \
         #NUM! when the iteration does not converge."),
    FunctionDef::eager("CUMIPMT", Financial, 6, Some(6),
        &[Param::scalar("rate"), Param::scalar("nper"), Param::scalar("pv"), Param::scalar("start_period"), Param::scalar("end_period"), Param::scalar("type")],
        fn_cumipmt,
        "Cumulative interest paid from start_period to end_period inclusive. #NUM! unless rate, nper and pv are positive, 1 <= start <= end <= nper and type is 0 or 1. \
         #NUM! when end_period exceeds 1,000,000."),
    FunctionDef::eager("CUMPRINC", Financial, 6, Some(6),
        &[Param::scalar("rate"), Param::scalar("nper"), Param::scalar("pv"), Param::scalar("start_period"), Param::scalar("end_period"), Param::scalar("type")],
        fn_cumprinc,
        "Cumulative principal paid from start_period to end_period inclusive. #NUM! unless rate, nper and pv are positive, 1 <= start <= end <= nper and type is 0 or 1. \
         #NUM! when end_period exceeds 1,000,000."),
    FunctionDef::eager("DB", Financial, 4, Some(5),
        &[Param::scalar("cost"), Param::scalar("salvage"), Param::scalar("life"), Param::scalar("period"), Param::scalar("month")],
        fn_db,
        "Fixed-declining-balance depreciation for period, with the rate rounded to three decimals and month (default 12) months in the first year. #NUM! when period exceeds 1,000,000."),
    FunctionDef::eager("DDB", Financial, 4, Some(5),
        &[Param::scalar("cost"), Param::scalar("salvage"), Param::scalar("life"), Param::scalar("period"), Param::scalar("factor")],
        fn_ddb,
        "Double-declining-balance depreciation for period (factor defaults to 2), never depreciating below salvage. #NUM! when period exceeds 1,000,000."),
    FunctionDef::eager("SLN", Financial, 3, Some(3),
        &[Param::scalar("cost"), Param::scalar("salvage"), Param::scalar("life")],
        fn_sln,
        "Straight-line depreciation per period: (cost - salvage) / life. #DIV/0! when life is 0."),
    FunctionDef::eager("SYD", Financial, 4, Some(4),
        &[Param::scalar("cost"), Param::scalar("salvage"), Param::scalar("life"), Param::scalar("per")],
        fn_syd,
        "Sum-of-years'-digits depreciation for period per. #NUM! unless 0 < per <= life."),
    FunctionDef::eager("EFFECT", Financial, 2, Some(2),
        &[Param::scalar("nominal_rate"), Param::scalar("npery")],
        fn_effect,
        "Effective annual rate from a nominal rate compounded npery times a year. #NUM! when nominal_rate <= 0 or npery < 1."),
    FunctionDef::eager("NOMINAL", Financial, 2, Some(2),
        &[Param::scalar("effect_rate"), Param::scalar("npery")],
        fn_nominal,
        "Nominal annual rate compounded npery times a year from an effective rate. #NUM! when effect_rate <= 0 or npery < 1."),
];

// === Time value of money ===

fn payment_type(args: &[FormulaValue], index: usize) -> Result<f64, CellError> {
    Ok(if opt_number(args, index, 0.0)? != 0.0 { 1.0 } else { 0.0 })
}

pub(crate) fn future_value(rate: f64, nper: f64, pmt: f64, pv: f64, typ: f64) -> f64 {
    if rate == 0.0 {
        return -(pv + pmt * nper);
    }
    let factor = (1.0 + rate).powf(nper);
    -(pv * factor + pmt * (1.0 + rate * typ) * (factor - 1.0) / rate)
}

pub(crate) fn present_value(rate: f64, nper: f64, pmt: f64, fv: f64, typ: f64) -> f64 {
    if rate == 0.0 {
        return -(fv + pmt * nper);
    }
    let factor = (1.0 + rate).powf(nper);
    -(fv + pmt * (1.0 + rate * typ) * (factor - 1.0) / rate) / factor
}

pub(crate) fn payment(rate: f64, nper: f64, pv: f64, fv: f64, typ: f64) -> Result<f64, CellError> {
    if nper == 0.0 {
        return Err(num_error("nper must not be 0"));
    }
    if rate == 0.0 {
        return Ok(-(pv + fv) / nper);
    }
    let factor = (1.0 + rate).powf(nper);
    Ok(-rate * (pv * factor + fv) / ((1.0 + rate * typ) * (factor - 1.0)))
}

fn interest_payment(rate: f64, per: f64, nper: f64, pv: f64, fv: f64, typ: f64) -> Result<f64, CellError> {
    if per < 1.0 || per > nper {
        return Err(num_error(format!("per must be between 1 and {}", nper)));
    }
    let pmt = payment(rate, nper, pv, fv, typ)?;
    let balance = if per == 1.0 {
        if typ == 1.0 {
            0.0
        } else {
            -pv
        }
    } else if typ == 1.0 {
        future_value(rate, per - 2.0, pmt, pv, 1.0) - pmt
    } else {
        future_value(rate, per - 1.0, pmt, pv, 0.0)
    };
    Ok(balance * rate)
}

/// PMT(rate, nper, pv, [fv], [type])
pub fn fn_pmt(args: &[FormulaValue]) -> FnResult {
    let rate = number_arg(args, 0)?;
    let nper = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fv = opt_number(args, 3, 0.0)?;
    let typ = payment_type(args, 4)?;
    payment(rate, nper, pv, fv, typ).map(FormulaValue::Number)
}

/// Arguments shared by IPMT and PPMT
fn period_args(args: &[FormulaValue]) -> Result<(f64, f64, f64, f64, f64, f64), CellError> {
    Ok((
        number_arg(args, 0)?,
        number_arg(args, 1)?,
        number_arg(args, 2)?,
        number_arg(args, 3)?,
        opt_number(args, 4, 0.0)?,
        payment_type(args, 5)?,
    ))
}

/// IPMT(rate, per, nper, pv, [fv], [type])
pub fn fn_ipmt(args: &[FormulaValue]) -> FnResult {
    let (rate, per, nper, pv, fv, typ) = period_args(args)?;
    interest_payment(rate, per, nper, pv, fv, typ).map(FormulaValue::Number)
}

/// PPMT(rate, per, nper, pv, [fv], [type])
pub fn fn_ppmt(args: &[FormulaValue]) -> FnResult {
    let (rate, per, nper, pv, fv, typ) = period_args(args)?;
    let interest = interest_payment(rate, per, nper, pv, fv, typ)?;
    Ok(FormulaValue::Number(payment(rate, nper, pv, fv, typ)? - interest))
}

/// FV(rate, nper, pmt, [pv], [type])
pub fn fn_fv(args: &[FormulaValue]) -> FnResult {
    let rate = number_arg(args, 0)?;
    let nper = number_arg(args, 1)?;
    let pmt = number_arg(args, 2)?;
    let pv = opt_number(args, 3, 0.0)?;
    let typ = payment_type(args, 4)?;
    Ok(FormulaValue::Number(future_value(rate, nper, pmt, pv, typ)))
}

/// PV(rate, nper, pmt, [fv], [type])
pub fn fn_pv(args: &[FormulaValue]) -> FnResult {
    let rate = number_arg(args, 0)?;
    let nper = number_arg(args, 1)?;
    let pmt = number_arg(args, 2)?;
    let fv = opt_number(args, 3, 0.0)?;
    let typ = payment_type(args, 4)?;
    Ok(FormulaValue::Number(present_value(rate, nper, pmt, fv, typ)))
}

/// NPER(rate, pmt, pv, [fv], [type])
pub fn fn_nper(args: &[FormulaValue]) -> FnResult {
    let rate = number_arg(args, 0)?;
    let pmt = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fv = opt_number(args, 3, 0.0)?;
    let typ = payment_type(args, 4)?;

    if rate == 0.0 {
        if pmt == 0.0 {
            return Err(num_error("pmt must not be 0 when rate is 0"));
        }
        return Ok(FormulaValue::Number(-(pv + fv) / pmt));
    }

    let adjusted = pmt * (1.0 + rate * typ);
    let ratio = (adjusted - fv * rate) / (pv * rate + adjusted);
    if ratio.is_nan() || ratio <= 0.0 || rate <= -1.0 {
        return Err(num_error("no number of periods reaches fv"));
    }
    Ok(FormulaValue::Number(ratio.ln() / (1.0 + rate).ln()))
}

// === Cash flows ===

/// NPV(rate, value1, [value2], ...)
pub fn fn_npv(args: &[FormulaValue]) -> FnResult {
    let rate = number_arg(args, 0)?;
    if rate == -1.0 {
        return Err(div_zero());
    }
    let flows = collect_numbers(&args[1..], Collect::Numbers)?;
    let npv = flows
        .iter()
        .enumerate()
        .map(|(i, v)| v / (1.0 + rate).powi(i as i32 + 1))
        .sum();
    Ok(FormulaValue::Number(npv))
}

/// Newton's method on `f`, with `df` its derivative
fn newton(
    what: &str,
    guess: f64,
    f: impl Fn(f64) -> f64,
    df: impl Fn(f64) -> f64,
) -> Result<f64, CellError> {
    let mut rate = guess;
    for _ in 0..MAX_ITERATIONS {
        let slope = df(rate);
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        let next = rate - f(rate) / slope;
        if !next.is_finite() || next <= -1.0 {
            break;
        }
        if (next - rate).abs() < ITERATION_TOLERANCE {
            return Ok(next);
        }
        rate = next;
    }

    warn!(function = what, guess, "iteration did not converge");
    Err(num_error(format!(
        "{} did not converge within {} iterations",
        what, MAX_ITERATIONS
    )))
}

/// IRR(values, [guess])
pub fn fn_irr(args: &[FormulaValue]) -> FnResult {
    let flows = array_numbers(&args[0])?;
    let guess = opt_number(args, 1, DEFAULT_GUESS)?;

    if !flows.iter().any(|v| *v > 0.0) || !flows.iter().any(|v| *v < 0.0) {
        return Err(num_error("cash flows need at least one positive and one negative value"));
    }

    let npv = |r: f64| -> f64 {
        flows
            .iter()
            .enumerate()
            .map(|(i, v)| v / (1.0 + r).powi(i as i32))
            .sum()
    };
    let slope = |r: f64| -> f64 {
        flows
            .iter()
            .enumerate()
            .map(|(i, v)| -(i as f64) * v / (1.0 + r).powi(i as i32 + 1))
            .sum()
    };
    newton("IRR", guess, npv, slope).map(FormulaValue::Number)
}

/// Annuity balance whose root is the rate, continuous through rate = 0
fn annuity_balance(rate: f64, nper: f64, pmt: f64, pv: f64, fv: f64, typ: f64) -> f64 {
    if rate.abs() < 1e-12 {
        return pv + pmt * nper + fv;
    }
    let factor = (1.0 + rate).powf(nper);
    pv * factor + pmt * (1.0 + rate * typ) * (factor - 1.0) / rate + fv
}

/// RATE(nper, pmt, pv, [fv], [type], [guess])
pub fn fn_rate(args: &[FormulaValue]) -> FnResult {
    let nper = number_arg(args, 0)?;
    let pmt = number_arg(args, 1)?;
    let pv = number_arg(args, 2)?;
    let fv = opt_number(args, 3, 0.0)?;
    let typ = payment_type(args, 4)?;
    let guess = opt_number(args, 5, DEFAULT_GUESS)?;

    if nper <= 0.0 {
        return Err(num_error("nper must be positive"));
    }

    let f = |r: f64| annuity_balance(r, nper, pmt, pv, fv, typ);
    // Central difference; the closed form has a removable singularity at 0
    let df = |r: f64| {
        let h = 1e-7 * r.abs().max(1.0);
        (f(r + h) - f(r - h)) / (2.0 * h)
    };
    newton("RATE", guess, f, df).map(FormulaValue::Number)
}

/// Validated arguments of CUMIPMT/CUMPRINC
fn cumulative_args(args: &[FormulaValue]) -> Result<(f64, f64, f64, f64, f64, f64), CellError> {
    let rate = number_arg(args, 0)?;
    let nper = number_arg(args, 1)?.trunc();
    let pv = number_arg(args, 2)?;
    let start = number_arg(args, 3)?.trunc();
    let end = number_arg(args, 4)?.trunc();
    let typ = number_arg(args, 5)?;

    if rate <= 0.0 || nper <= 0.0 || pv <= 0.0 {
        return Err(num_error("rate, nper and pv must be positive"));
    }
    if start < 1.0 || end < start || end > nper {
        return Err(num_error("periods must satisfy 1 <= start <= end <= nper"));
    }
    if typ != 0.0 && typ != 1.0 {
        return Err(num_error("type must be 0 or 1"));
    }
    if end > MAX_PERIODS {
        return Err(num_error("end_period is past the period limit"));
    }
    Ok((rate, nper, pv, start, end, typ))
}

/// CUMIPMT(rate, nper, pv, start_period, end_period, type)
pub fn fn_cumipmt(args: &[FormulaValue]) -> FnResult {
    let (rate, nper, pv, start, end, typ) = cumulative_args(args)?;
    let mut total = 0.0;
    let mut per = start;
    while per <= end {
        total += interest_payment(rate, per, nper, pv, 0.0, typ)?;
        per += 1.0;
    }
    Ok(FormulaValue::Number(total))
}

/// CUMPRINC(rate, nper, pv, start_period, end_period, type)
pub fn fn_cumprinc(args: &[FormulaValue]) -> FnResult {
    let (rate, nper, pv, start, end, typ) = cumulative_args(args)?;
    let pmt = payment(rate, nper, pv, 0.0, typ)?;
    let mut total = 0.0;
    let mut per = start;
    while per <= end {
        total += pmt - interest_payment(rate, per, nper, pv, 0.0, typ)?;
        per += 1.0;
    }
    Ok(FormulaValue::Number(total))
}

// === Depreciation ===

/// DB(cost, salvage, life, period, [month])
pub fn fn_db(args: &[FormulaValue]) -> FnResult {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?.trunc();
    let period = number_arg(args, 3)?.trunc();
    let month = opt_int(args, 4, 12.0)?;

    let last_period = if month < 12.0 { life + 1.0 } else { life };
    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || period <= 0.0 || period > last_period {
        return Err(num_error("invalid depreciation arguments"));
    }
    if !(1.0..=12.0).contains(&month) {
        return Err(num_error("month must be between 1 and 12"));
    }
    if period > MAX_PERIODS {
        return Err(num_error("period is past the period limit"));
    }
    if cost == 0.0 {
        return Ok(FormulaValue::Number(0.0));
    }

    let rate = ((1.0 - (salvage / cost).powf(1.0 / life)) * 1000.0).round() / 1000.0;
    let mut total = cost * rate * month / 12.0;
    if period == 1.0 {
        return Ok(FormulaValue::Number(total));
    }

    let mut depreciation = total;
    let mut p = 2.0;
    while p <= period {
        depreciation = if p == life + 1.0 {
            (cost - total) * rate * (12.0 - month) / 12.0
        } else {
            (cost - total) * rate
        };
        total += depreciation;
        p += 1.0;
    }
    Ok(FormulaValue::Number(depreciation))
}

/// DDB(cost, salvage, life, period, [factor])
pub fn fn_ddb(args: &[FormulaValue]) -> FnResult {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let period = number_arg(args, 3)?.ceil();
    let factor = opt_number(args, 4, 2.0)?;

    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || period <= 0.0 || period > life.ceil() || factor <= 0.0 {
        return Err(num_error("invalid depreciation arguments"));
    }
    if period > MAX_PERIODS {
        return Err(num_error("period is past the period limit"));
    }

    let mut total = 0.0;
    let mut depreciation = 0.0;
    let mut p = 1.0;
    while p <= period {
        let book = cost - total;
        depreciation = (book * factor / life).min((book - salvage).max(0.0));
        total += depreciation;
        p += 1.0;
    }
    Ok(FormulaValue::Number(depreciation))
}

/// SLN(cost, salvage, life)
pub fn fn_sln(args: &[FormulaValue]) -> FnResult {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    if life == 0.0 {
        return Err(div_zero());
    }
    Ok(FormulaValue::Number((cost - salvage) / life))
}

/// SYD(cost, salvage, life, per)
pub fn fn_syd(args: &[FormulaValue]) -> FnResult {
    let cost = number_arg(args, 0)?;
    let salvage = number_arg(args, 1)?;
    let life = number_arg(args, 2)?;
    let per = number_arg(args, 3)?;
    if life <= 0.0 || per <= 0.0 || per > life {
        return Err(num_error("per must satisfy 0 < per <= life"));
    }
    Ok(FormulaValue::Number(
        (cost - salvage) * (life - per + 1.0) * 2.0 / (life * (life + 1.0)),
    ))
}

// === Interest rate conversion ===

fn rate_args(args: &[FormulaValue]) -> Result<(f64, f64), CellError> {
    let rate = number_arg(args, 0)?;
    let npery = number_arg(args, 1)?.trunc();
    if rate <= 0.0 || npery < 1.0 {
        return Err(num_error("rate must be positive and npery at least 1"));
    }
    Ok((rate, npery))
}

/// EFFECT(nominal_rate, npery)
pub fn fn_effect(args: &[FormulaValue]) -> FnResult {
    let (nominal, npery) = rate_args(args)?;
    Ok(FormulaValue::Number((1.0 + nominal / npery).powf(npery) - 1.0))
}

/// NOMINAL(effect_rate, npery)
pub fn fn_nominal(args: &[FormulaValue]) -> FnResult {
    let (effect, npery) = rate_args(args)?;
    Ok(FormulaValue::Number(npery * ((1.0 + effect).powf(1.0 / npery) - 1.0)))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{approx, eval, num};
    use crate::FormulaValue;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    #[test]
    fn test_pmt_fv_pv() {
        approx(&eval("=PMT(0.08/12,10,10000)"), -1037.03208935915);
        assert_eq!(eval("=PMT(0,10,1000)"), num(-100.0));
        assert_eq!(eval("=PMT(0.1,0,1000)"), err(ErrorKind::NumericError));
        approx(&eval("=FV(0.06/12,10,-200,-500,1)"), 2581.40337406012);
        approx(&eval("=PV(0.08/12,12*20,500,0,0)"), -59777.1458511878);
        assert_eq!(eval("=FV(0,12,-100)"), num(1200.0));
    }

    #[test]
    fn test_nper() {
        approx(&eval("=NPER(0.12/12,-100,-1000,10000,1)"), 59.6738656742946);
        assert_eq!(eval("=NPER(0,-100,1000)"), num(10.0));
        assert_eq!(eval("=NPER(0.1,-50,1000)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_interest_and_principal_parts() {
        approx(&eval("=IPMT(0.1/12,1,3*12,8000)"), -66.6666666666667);
        approx(&eval("=IPMT(0.1,3,3,8000)"), -292.447129909366);
        approx(&eval("=PPMT(0.1/12,1,2*12,2000)"), -75.6231860083663);
        assert_eq!(eval("=IPMT(0.1,4,3,8000)"), err(ErrorKind::NumericError));
        approx(&eval("=CUMIPMT(0.09/12,30*12,125000,13,24,0)"), -11135.2321307508);
        approx(&eval("=CUMPRINC(0.09/12,30*12,125000,13,24,0)"), -934.107123420868);
        assert_eq!(
            eval("=CUMIPMT(0.09/12,360,125000,24,13,0)"),
            err(ErrorKind::NumericError)
        );
    }

    #[test]
    fn test_npv_irr_rate() {
        approx(&eval("=NPV(0.1,-10000,3000,4200,6800)"), 1188.44341233522);
        assert_eq!(eval("=NPV(-1,100)"), err(ErrorKind::DivideByZero));
        approx(&eval("=IRR({-70000,12000,15000,18000,21000,26000})"), 0.0866309480365316);
        approx(&eval("=IRR({-100,110})"), 0.1);
        assert_eq!(eval("=IRR({1,2,3})"), err(ErrorKind::NumericError));
        approx(&eval("=RATE(48,-200,8000)"), 0.00770147248820256);
    }

    #[test]
    fn test_depreciation() {
        assert_eq!(eval("=SLN(30000,7500,10)"), num(2250.0));
        assert_eq!(eval("=SLN(1,0,0)"), err(ErrorKind::DivideByZero));
        approx(&eval("=SYD(30000,7500,10,1)"), 4090.90909090909);
        approx(&eval("=DB(1000000,100000,6,1,7)"), 186083.333333333);
        approx(&eval("=DB(1000000,100000,6,2,7)"), 259639.416666667);
        approx(&eval("=DDB(2400,300,10*365,1)"), 1.31506849315068);
        assert_eq!(eval("=DDB(2400,300,10,2)"), num(384.0));
        assert_eq!(eval("=DDB(2400,300,10,11)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_period_limit() {
        // Stepped one period at a time, so huge periods are refused up front
        assert_eq!(eval("=DDB(1,0,1E17,1E17)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=DB(1,0.5,1E17,1E17)"), err(ErrorKind::NumericError));
        assert_eq!(
            eval("=CUMIPMT(0.01,1E17,1,1,1E17,0)"),
            err(ErrorKind::NumericError)
        );
        assert_eq!(
            eval("=CUMPRINC(0.01,1E17,1,1,1E17,0)"),
            err(ErrorKind::NumericError)
        );

        // A long life is fine as long as the period stays small
        approx(&eval("=DDB(1,0,1E17,1)"), 2e-17);
        assert!(matches!(eval("=DDB(1,0,1000000,1000000)"), FormulaValue::Number(_)));
    }

    #[test]
    fn test_effect_nominal() {
        approx(&eval("=EFFECT(0.0525,4)"), 0.0535426673707584);
        approx(&eval("=NOMINAL(EFFECT(0.0525,4),4)"), 0.0525);
        assert_eq!(eval("=EFFECT(0,4)"), err(ErrorKind::NumericError));
    }
}
