//! Math functions

use super::{
    dims, div_zero, flat, num_error, number_arg, opt_int, opt_number, value_error, FnResult,
    FunctionCategory::Math, FunctionDef, Param,
};
use crate::evaluator::power;
use crate::value::FormulaValue;
use cellcalc_core::CellError;
use std::f64::consts::PI;

/// Largest magnitude the trigonometric functions accept
const MAX_TRIG_ARG: f64 = 134_217_728.0;

/// Bitwise operands are below 2^48
const BIT_LIMIT: f64 = 281_474_976_710_656.0;

const MAX_SHIFT: f64 = 53.0;

const NUMBER: &[Param] = &[Param::scalar("number")];
const ROUNDING: &[Param] = &[Param::scalar("number"), Param::scalar("num_digits")];
const BITS: &[Param] = &[Param::scalar("number1"), Param::scalar("number2")];
const SHIFT: &[Param] = &[Param::scalar("number"), Param::scalar("shift_amount")];

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("ROUND", Math, 1, Some(2), ROUNDING, fn_round,
        "Rounds number to num_digits decimal places (default 0), halves away from zero. Negative num_digits rounds left of the decimal point."),
    FunctionDef::eager("ROUNDUP", Math, 1, Some(2), ROUNDING, fn_roundup,
        "Rounds number away from zero to num_digits decimal places (default 0)."),
    FunctionDef::eager("ROUNDDOWN", Math, 1, Some(2), ROUNDING, fn_rounddown,
        "Rounds number toward zero to num_digits decimal places (default 0)."),
    FunctionDef::eager("MOD", Math, 2, Some(2), &[Param::scalar("number"), Param::scalar("divisor")], fn_mod,
        "Remainder of number / divisor, with the sign of the divisor. #DIV/0! when divisor is 0."),
    FunctionDef::eager("ABS", Math, 1, Some(1), NUMBER, fn_abs,
        "Absolute value of number."),
    FunctionDef::eager("POWER", Math, 2, Some(2), &[Param::scalar("number"), Param::scalar("power")], fn_power,
        "number raised to power, like the ^ operator. #NUM! for 0^0 or a negative number with a fractional power; #DIV/0! for 0 to a negative power."),
    FunctionDef::eager("SQRT", Math, 1, Some(1), NUMBER, fn_sqrt,
        "Positive square root of number. #NUM! when number is negative."),
    FunctionDef::eager("PI", Math, 0, Some(0), &[], fn_pi,
        "The constant pi, 3.14159265358979."),
    FunctionDef::eager("SIN", Math, 1, Some(1), NUMBER, fn_sin,
        "Sine of an angle in radians. #NUM! when |number| >= 2^27."),
    FunctionDef::eager("COS", Math, 1, Some(1), NUMBER, fn_cos,
        "Cosine of an angle in radians. #NUM! when |number| >= 2^27."),
    FunctionDef::eager("TAN", Math, 1, Some(1), NUMBER, fn_tan,
        "Tangent of an angle in radians. #NUM! when |number| >= 2^27."),
    FunctionDef::eager("ASIN", Math, 1, Some(1), NUMBER, fn_asin,
        "Arcsine in radians. #NUM! when number is outside -1..1."),
    FunctionDef::eager("ACOS", Math, 1, Some(1), NUMBER, fn_acos,
        "Arccosine in radians. #NUM! when number is outside -1..1."),
    FunctionDef::eager("ATAN", Math, 1, Some(1), NUMBER, fn_atan,
        "Arctangent in radians."),
    FunctionDef::eager("ATAN2", Math, 2, Some(2), &[Param::scalar("x_num"), Param::scalar("y_num")], fn_atan2,
        "Angle in radians of the point (x_num, y_num) from the x axis. #DIV/0! when both are 0."),
    FunctionDef::eager("SINH", Math, 1, Some(1), NUMBER, fn_sinh,
        "Hyperbolic sine of number."),
    FunctionDef::eager("COSH", Math, 1, Some(1), NUMBER, fn_cosh,
        "Hyperbolic cosine of number."),
    FunctionDef::eager("TANH", Math, 1, Some(1), NUMBER, fn_tanh,
        "Hyperbolic tangent of number."),
    FunctionDef::eager("DEGREES", Math, 1, Some(1), &[Param::scalar("angle")], fn_degrees,
        "Converts radians to degrees."),
    FunctionDef::eager("RADIANS", Math, 1, Some(1), &[Param::scalar("angle")], fn_radians,
        "Converts degrees to radians."),
    FunctionDef::eager("EXP", Math, 1, Some(1), NUMBER, fn_exp,
        "e raised to number. #NUM! when the result overflows."),
    FunctionDef::eager("LN", Math, 1, Some(1), NUMBER, fn_ln,
        "Natural logarithm. #NUM! when number <= 0."),
    FunctionDef::eager("LOG", Math, 1, Some(2), &[Param::scalar("number"), Param::scalar("base")], fn_log,
        "Logarithm of number to base (default 10). #NUM! when number or base <= 0; #DIV/0! when base is 1."),
    FunctionDef::eager("LOG10", Math, 1, Some(1), NUMBER, fn_log10,
        "Base-10 logarithm. #NUM! when number <= 0."),
    FunctionDef::eager("INT", Math, 1, Some(1), NUMBER, fn_int,
        "Rounds number down to the nearest integer, toward negative infinity."),
    FunctionDef::eager("TRUNC", Math, 1, Some(2), ROUNDING, fn_trunc,
        "Truncates number toward zero to num_digits decimal places (default 0)."),
    FunctionDef::eager("SIGN", Math, 1, Some(1), NUMBER, fn_sign,
        "1 for a positive number, -1 for a negative number, 0 for zero."),
    FunctionDef::eager("CEILING", Math, 1, Some(2), &[Param::scalar("number"), Param::scalar("significance")], fn_ceiling,
        "Rounds number up to a multiple of significance (default 1); negative numbers with a negative significance round away from zero. \
         0 when significance is 0; #NUM! when number is positive and significance negative."),
    FunctionDef::eager("FLOOR", Math, 1, Some(2), &[Param::scalar("number"), Param::scalar("significance")], fn_floor,
        "Rounds number down to a multiple of significance (default 1); negative numbers with a negative significance round toward zero. \
         #DIV/0! when significance is 0; #NUM! when number is positive and significance negative."),
    FunctionDef::eager("SUMPRODUCT", Math, 1, None, &[Param::array("array")], fn_sumproduct,
        "Sum of the products of corresponding elements of equally-sized arrays. Non-numeric elements count as 0; #VALUE! when the sizes differ.").repeating(1),
    FunctionDef::eager("BITAND", Math, 2, Some(2), BITS, fn_bitand,
        "Bitwise AND of two integers in 0..2^48. #NUM! otherwise."),
    FunctionDef::eager("BITOR", Math, 2, Some(2), BITS, fn_bitor,
        "Bitwise OR of two integers in 0..2^48. #NUM! otherwise."),
    FunctionDef::eager("BITXOR", Math, 2, Some(2), BITS, fn_bitxor,
        "Bitwise exclusive OR of two integers in 0..2^48. #NUM! otherwise."),
    FunctionDef::eager("BITLSHIFT", Math, 2, Some(2), SHIFT, fn_bitlshift,
        "number shifted left by shift_amount bits (right when negative). #NUM! when |shift_amount| > 53 or the result reaches 2^48."),
    FunctionDef::eager("BITRSHIFT", Math, 2, Some(2), SHIFT, fn_bitrshift,
        "number shifted right by shift_amount bits (left when negative). #NUM! when |shift_amount| > 53 or the result reaches 2^48."),
];

/// Apply a unary function to the first argument
fn unary(args: &[FormulaValue], f: impl Fn(f64) -> FnResult) -> FnResult {
    f(number_arg(args, 0)?)
}

fn number(n: f64) -> FnResult {
    Ok(FormulaValue::Number(n))
}

/// Number and digit count shared by the rounding functions
fn rounding_args(args: &[FormulaValue]) -> Result<(f64, i32), CellError> {
    let number = number_arg(args, 0)?;
    let digits = opt_int(args, 1, 0.0)?.clamp(-308.0, 308.0) as i32;
    Ok((number, digits))
}

/// Scale `number` by 10^digits, round the magnitude with `round` and scale back
///
/// The scaled magnitude is nudged by a few ulps so that values such as
/// 2.675, stored just below the decimal they were typed as, round like the
/// decimal.
fn round_with(number: f64, digits: i32, round: fn(f64) -> f64) -> f64 {
    if digits > 15 {
        return number;
    }
    let multiplier = 10_f64.powi(digits);
    let scaled = number.abs() * multiplier;
    let nudged = scaled + scaled * f64::EPSILON * 4.0;
    number.signum() * round(nudged) / multiplier
}

/// ROUND(number, [num_digits])
pub fn fn_round(args: &[FormulaValue]) -> FnResult {
    let (n, digits) = rounding_args(args)?;
    number(round_with(n, digits, |x| (x + 0.5).floor()))
}

/// ROUNDUP(number, [num_digits])
pub fn fn_roundup(args: &[FormulaValue]) -> FnResult {
    let (n, digits) = rounding_args(args)?;
    if digits > 15 {
        return number(n);
    }
    let multiplier = 10_f64.powi(digits);
    let scaled = n.abs() * multiplier;
    // Drop representation noise so 0.1 * 3 does not round up to 0.31
    let cleaned = if scaled < 1e6 {
        (scaled * 1e9).round() / 1e9
    } else {
        scaled
    };
    number(n.signum() * cleaned.ceil() / multiplier)
}

/// ROUNDDOWN(number, [num_digits])
pub fn fn_rounddown(args: &[FormulaValue]) -> FnResult {
    let (n, digits) = rounding_args(args)?;
    number(round_with(n, digits, f64::floor))
}

/// TRUNC(number, [num_digits])
pub fn fn_trunc(args: &[FormulaValue]) -> FnResult {
    fn_rounddown(args)
}

/// MOD(number, divisor)
pub fn fn_mod(args: &[FormulaValue]) -> FnResult {
    let n = number_arg(args, 0)?;
    let divisor = number_arg(args, 1)?;
    if divisor == 0.0 {
        return Err(div_zero());
    }
    let result = n - divisor * (n / divisor).floor();
    // Precision can push the remainder onto the divisor itself
    if result == divisor {
        return number(0.0);
    }
    number(result)
}

pub fn fn_abs(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.abs()))
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue]) -> FnResult {
    number(power(number_arg(args, 0)?, number_arg(args, 1)?)?)
}

pub fn fn_sqrt(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| {
        if n < 0.0 {
            return Err(num_error("square root of a negative number"));
        }
        number(n.sqrt())
    })
}

pub fn fn_pi(_args: &[FormulaValue]) -> FnResult {
    number(PI)
}

fn trig(args: &[FormulaValue], f: fn(f64) -> f64) -> FnResult {
    unary(args, |n| {
        if n.abs() >= MAX_TRIG_ARG {
            return Err(num_error("angle is too large"));
        }
        number(f(n))
    })
}

pub fn fn_sin(args: &[FormulaValue]) -> FnResult {
    trig(args, f64::sin)
}

pub fn fn_cos(args: &[FormulaValue]) -> FnResult {
    trig(args, f64::cos)
}

pub fn fn_tan(args: &[FormulaValue]) -> FnResult {
    trig(args, f64::tan)
}

/// Inverse trig over -1..1
fn unit_domain(args: &[FormulaValue], f: fn(f64) -> f64) -> FnResult {
    unary(args, |n| {
        if !(-1.0..=1.0).contains(&n) {
            return Err(num_error("argument must be between -1 and 1"));
        }
        number(f(n))
    })
}

pub fn fn_asin(args: &[FormulaValue]) -> FnResult {
    unit_domain(args, f64::asin)
}

pub fn fn_acos(args: &[FormulaValue]) -> FnResult {
    unit_domain(args, f64::acos)
}

pub fn fn_atan(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.atan()))
}

/// ATAN2(x_num, y_num)
pub fn fn_atan2(args: &[FormulaValue]) -> FnResult {
    let x = number_arg(args, 0)?;
    let y = number_arg(args, 1)?;
    if x == 0.0 && y == 0.0 {
        return Err(div_zero());
    }
    number(y.atan2(x))
}

pub fn fn_sinh(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.sinh()))
}

pub fn fn_cosh(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.cosh()))
}

pub fn fn_tanh(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.tanh()))
}

pub fn fn_degrees(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.to_degrees()))
}

pub fn fn_radians(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.to_radians()))
}

pub fn fn_exp(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.exp()))
}

fn positive(n: f64) -> Result<f64, CellError> {
    if n <= 0.0 {
        return Err(num_error("logarithm of a non-positive number"));
    }
    Ok(n)
}

pub fn fn_ln(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(positive(n)?.ln()))
}

/// LOG(number, [base])
pub fn fn_log(args: &[FormulaValue]) -> FnResult {
    let n = positive(number_arg(args, 0)?)?;
    let base = positive(opt_number(args, 1, 10.0)?)?;
    if base == 1.0 {
        return Err(div_zero());
    }
    number(n.ln() / base.ln())
}

pub fn fn_log10(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(positive(n)?.log10()))
}

pub fn fn_int(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| number(n.floor()))
}

pub fn fn_sign(args: &[FormulaValue]) -> FnResult {
    unary(args, |n| {
        number(if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        })
    })
}

/// Number and significance for CEILING/FLOOR
fn significance_args(args: &[FormulaValue]) -> Result<(f64, f64), CellError> {
    let n = number_arg(args, 0)?;
    let significance = opt_number(args, 1, 1.0)?;
    if n > 0.0 && significance < 0.0 {
        return Err(num_error("number and significance have different signs"));
    }
    Ok((n, significance))
}

/// CEILING(number, [significance])
pub fn fn_ceiling(args: &[FormulaValue]) -> FnResult {
    let (n, significance) = significance_args(args)?;
    if significance == 0.0 {
        return number(0.0);
    }
    number((n / significance).ceil() * significance)
}

/// FLOOR(number, [significance])
pub fn fn_floor(args: &[FormulaValue]) -> FnResult {
    let (n, significance) = significance_args(args)?;
    if significance == 0.0 {
        return Err(div_zero());
    }
    number((n / significance).floor() * significance)
}

/// SUMPRODUCT(array1, [array2], ...)
pub fn fn_sumproduct(args: &[FormulaValue]) -> FnResult {
    let shape = dims(&args[0]);
    if args.iter().any(|arg| dims(arg) != shape) {
        return Err(value_error("arrays must have the same dimensions"));
    }

    let mut products = vec![1.0; shape.0 * shape.1];
    for arg in args {
        for (product, value) in products.iter_mut().zip(flat(arg)) {
            match value {
                FormulaValue::Number(n) => *product *= n,
                FormulaValue::Error(e) => return Err(e.clone()),
                _ => *product = 0.0,
            }
        }
    }
    number(products.iter().sum())
}

/// Bitwise operand: an integer in 0..2^48
fn bit_operand(args: &[FormulaValue], index: usize) -> Result<u64, CellError> {
    let n = number_arg(args, index)?;
    if n < 0.0 || n >= BIT_LIMIT || n.fract() != 0.0 {
        return Err(num_error("bitwise operands must be integers in 0..2^48"));
    }
    Ok(n as u64)
}

fn bitwise(args: &[FormulaValue], op: fn(u64, u64) -> u64) -> FnResult {
    let a = bit_operand(args, 0)?;
    let b = bit_operand(args, 1)?;
    number(op(a, b) as f64)
}

pub fn fn_bitand(args: &[FormulaValue]) -> FnResult {
    bitwise(args, |a, b| a & b)
}

pub fn fn_bitor(args: &[FormulaValue]) -> FnResult {
    bitwise(args, |a, b| a | b)
}

pub fn fn_bitxor(args: &[FormulaValue]) -> FnResult {
    bitwise(args, |a, b| a ^ b)
}

/// Shift left by `amount` bits, right when negative
fn shift(args: &[FormulaValue], direction: f64) -> FnResult {
    let n = bit_operand(args, 0)?;
    let amount = number_arg(args, 1)?.trunc() * direction;
    if amount.abs() > MAX_SHIFT {
        return Err(num_error("shift amount must be between -53 and 53"));
    }

    let result = if amount >= 0.0 {
        (n as f64) * 2_f64.powi(amount as i32)
    } else {
        (n >> (-amount as u32)) as f64
    };
    if result >= BIT_LIMIT {
        return Err(num_error("shifted value exceeds 2^48"));
    }
    number(result)
}

/// BITLSHIFT(number, shift_amount)
pub fn fn_bitlshift(args: &[FormulaValue]) -> FnResult {
    shift(args, 1.0)
}

/// BITRSHIFT(number, shift_amount)
pub fn fn_bitrshift(args: &[FormulaValue]) -> FnResult {
    shift(args, -1.0)
}
