//! Date functions
//!
//! Dates are serial day numbers counted from 1899-12-30, so serial 1 is
//! 1899-12-31 and 45306 is 2024-01-15. There is no phantom 1900-02-29:
//! every serial maps to a real calendar day. Time of day is the fractional
//! part of a serial and is ignored by the functions here.

use super::{
    flat, int_arg, num_error, opt_int, text_arg, value_error, FnResult,
    FunctionCategory::Date, FunctionDef, Param,
};
use crate::value::{parse_numeric_text, FormulaValue};
use cellcalc_core::CellError;
use chrono::{Datelike, Months, NaiveDate, Weekday};
use lazy_regex::regex_captures;
use std::collections::BTreeSet;

/// Largest serial accepted (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("DATE", Date, 3, Some(3),
        &[Param::scalar("year"), Param::scalar("month"), Param::scalar("day")], fn_date,
        "Serial number of the given date. Years 0-1899 are offset by 1900; months and days outside their range roll over into neighbouring months and years. \
         #NUM! for years outside 0-9999 or dates before the epoch."),
    FunctionDef::eager("DATEVALUE", Date, 1, Some(1), &[Param::scalar("date_text")], fn_datevalue,
        "Serial number of an ISO date text (YYYY-MM-DD, optionally followed by a time). Invalid date text is #VALUE!."),
    FunctionDef::eager("YEAR", Date, 1, Some(1), &[Param::scalar("serial_number")], fn_year,
        "Year of a date given as a serial number or ISO date text."),
    FunctionDef::eager("MONTH", Date, 1, Some(1), &[Param::scalar("serial_number")], fn_month,
        "Month (1-12) of a date given as a serial number or ISO date text."),
    FunctionDef::eager("DAY", Date, 1, Some(1), &[Param::scalar("serial_number")], fn_day,
        "Day of the month (1-31) of a date given as a serial number or ISO date text."),
    FunctionDef::eager("WEEKDAY", Date, 1, Some(2),
        &[Param::scalar("serial_number"), Param::scalar("return_type")], fn_weekday,
        "Day of the week. return_type 1 (default): Sunday=1..Saturday=7; 2: Monday=1..Sunday=7; 3: Monday=0..Sunday=6; \
         11-17: 1 for Monday..Sunday respectively as the first day. Other return types are #NUM!."),
    FunctionDef::eager("WEEKNUM", Date, 1, Some(2),
        &[Param::scalar("serial_number"), Param::scalar("return_type")], fn_weeknum,
        "Week of the year, counting the week containing January 1 as week 1. return_type 1 (default) starts weeks on Sunday, 2 on Monday, \
         11-17 on Monday..Sunday; 21 returns the ISO 8601 week number."),
    FunctionDef::eager("EDATE", Date, 2, Some(2),
        &[Param::scalar("start_date"), Param::scalar("months")], fn_edate,
        "Serial number of the date months after start_date (negative goes back), clamped to the end of the target month."),
    FunctionDef::eager("EOMONTH", Date, 2, Some(2),
        &[Param::scalar("start_date"), Param::scalar("months")], fn_eomonth,
        "Serial number of the last day of the month months after start_date."),
    FunctionDef::eager("NETWORKDAYS", Date, 2, Some(3),
        &[Param::scalar("start_date"), Param::scalar("end_date"), Param::array("holidays")], fn_networkdays,
        "Number of weekdays (Monday-Friday) from start_date to end_date inclusive, excluding holidays. Negative when end_date precedes start_date."),
    FunctionDef::eager("WORKDAY", Date, 2, Some(3),
        &[Param::scalar("start_date"), Param::scalar("days"), Param::array("holidays")], fn_workday,
        "Serial number of the date days working days (Monday-Friday, not a holiday) after start_date; negative days go back."),
    FunctionDef::eager("YEARFRAC", Date, 2, Some(3),
        &[Param::scalar("start_date"), Param::scalar("end_date"), Param::scalar("basis")], fn_yearfrac,
        "Fraction of a year between two dates. basis 0 (default): US 30/360; 1: actual/actual; 2: actual/360; 3: actual/365; 4: European 30/360. \
         Other bases are #NUM!."),
    FunctionDef::eager("DAYS", Date, 2, Some(2),
        &[Param::scalar("end_date"), Param::scalar("start_date")], fn_days,
        "Number of days from start_date to end_date (negative when end_date is earlier)."),
    FunctionDef::eager("DATEDIF", Date, 3, Some(3),
        &[Param::scalar("start_date"), Param::scalar("end_date"), Param::scalar("unit")], fn_datedif,
        "Difference between two dates in whole units: \"Y\" years, \"M\" months, \"D\" days, \"MD\" days ignoring months and years, \
         \"YM\" months ignoring years, \"YD\" days ignoring years. #NUM! when start_date is after end_date or the unit is unknown."),
];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Date for a serial number; the fraction (time of day) is dropped
pub fn date_from_serial(serial: f64) -> Result<NaiveDate, CellError> {
    if serial < 0.0 {
        return Err(num_error("dates before 1899-12-30 are not supported"));
    }
    if serial > MAX_SERIAL {
        return Err(num_error("dates after 9999-12-31 are not supported"));
    }
    epoch()
        .checked_add_signed(chrono::Duration::days(serial.floor() as i64))
        .ok_or_else(|| num_error("date out of range"))
}

/// Serial number of a date
pub fn serial_from_date(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

/// Parse ISO date text (`YYYY-MM-DD`, optional `THH:MM[:SS]` or space-separated time)
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let (_, year, month, day) = regex_captures!(
        r"^\s*(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?\s*$",
        text
    )?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Date argument: a serial number or ISO date text
fn date_arg(args: &[FormulaValue], index: usize) -> Result<NaiveDate, CellError> {
    match args.get(index) {
        Some(FormulaValue::Text(text)) => match parse_date_text(text) {
            Some(date) => Ok(date),
            None => parse_numeric_text(text)
                .ok_or_else(|| value_error(format!("'{}' is not a date", text)))
                .and_then(date_from_serial),
        },
        Some(value) => date_from_serial(value.to_number()?),
        None => Err(value_error("missing date")),
    }
}

fn serial(date: NaiveDate) -> FnResult {
    Ok(FormulaValue::Number(serial_from_date(date)))
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_year(year: i32) -> i64 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

fn last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

fn add_months(date: NaiveDate, months: i64) -> Result<NaiveDate, CellError> {
    let shifted = if months >= 0 {
        u32::try_from(months)
            .ok()
            .and_then(|m| date.checked_add_months(Months::new(m)))
    } else {
        u32::try_from(-months)
            .ok()
            .and_then(|m| date.checked_sub_months(Months::new(m)))
    };
    shifted
        .filter(|d| serial_from_date(*d) >= 0.0 && serial_from_date(*d) <= MAX_SERIAL)
        .ok_or_else(|| num_error("date out of range"))
}

/// DATE(year, month, day)
pub fn fn_date(args: &[FormulaValue]) -> FnResult {
    let mut year = int_arg(args, 0)?;
    let month = int_arg(args, 1)?;
    let day = int_arg(args, 2)?;

    if (0.0..1900.0).contains(&year) {
        year += 1900.0;
    }
    if !(0.0..10000.0).contains(&year) || month.abs() > 1.0e6 || day.abs() > 1.0e8 {
        return Err(num_error("year must be between 0 and 9999"));
    }

    // Roll months over into years, then days over into months
    let total_months = year as i64 * 12 + month as i64 - 1;
    let first = i32::try_from(total_months.div_euclid(12))
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, total_months.rem_euclid(12) as u32 + 1, 1))
        .ok_or_else(|| num_error("date out of range"))?;
    let date = first
        .checked_add_signed(chrono::Duration::days(day as i64 - 1))
        .ok_or_else(|| num_error("date out of range"))?;

    let n = serial_from_date(date);
    if !(0.0..=MAX_SERIAL).contains(&n) {
        return Err(num_error("date out of range"));
    }
    Ok(FormulaValue::Number(n))
}

/// DATEVALUE(date_text)
pub fn fn_datevalue(args: &[FormulaValue]) -> FnResult {
    let text = match &args[0] {
        FormulaValue::Text(text) => text,
        other => return Err(value_error(format!("expected date text, got {}", other.type_name()))),
    };
    let date = parse_date_text(text).ok_or_else(|| value_error(format!("'{}' is not a date", text)))?;
    serial(date)
}

pub fn fn_year(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(f64::from(date_arg(args, 0)?.year())))
}

pub fn fn_month(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(f64::from(date_arg(args, 0)?.month())))
}

pub fn fn_day(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(f64::from(date_arg(args, 0)?.day())))
}

/// First day of the week for WEEKDAY/WEEKNUM return types 11-17
fn week_start(return_type: f64) -> Option<Weekday> {
    match return_type as i64 {
        11 => Some(Weekday::Mon),
        12 => Some(Weekday::Tue),
        13 => Some(Weekday::Wed),
        14 => Some(Weekday::Thu),
        15 => Some(Weekday::Fri),
        16 => Some(Weekday::Sat),
        17 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Days from `start` forward to `day`, 0-6
fn days_after(day: Weekday, start: Weekday) -> u32 {
    (day.num_days_from_monday() + 7 - start.num_days_from_monday()) % 7
}

/// WEEKDAY(serial_number, [return_type])
pub fn fn_weekday(args: &[FormulaValue]) -> FnResult {
    let weekday = date_arg(args, 0)?.weekday();
    let return_type = opt_int(args, 1, 1.0)?;
    let n = match return_type as i64 {
        1 => weekday.number_from_sunday(),
        2 => weekday.number_from_monday(),
        3 => weekday.num_days_from_monday(),
        _ => match week_start(return_type) {
            Some(start) => days_after(weekday, start) + 1,
            None => return Err(num_error(format!("invalid return_type {}", return_type))),
        },
    };
    Ok(FormulaValue::Number(f64::from(n)))
}

/// WEEKNUM(serial_number, [return_type])
pub fn fn_weeknum(args: &[FormulaValue]) -> FnResult {
    let date = date_arg(args, 0)?;
    let return_type = opt_int(args, 1, 1.0)?;
    let start = match return_type as i64 {
        1 => Weekday::Sun,
        2 => Weekday::Mon,
        21 => return Ok(FormulaValue::Number(f64::from(date.iso_week().week()))),
        _ => week_start(return_type)
            .ok_or_else(|| num_error(format!("invalid return_type {}", return_type)))?,
    };

    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).ok_or_else(|| num_error("date out of range"))?;
    let offset = days_after(jan1.weekday(), start);
    Ok(FormulaValue::Number(f64::from((date.ordinal0() + offset) / 7 + 1)))
}

/// EDATE(start_date, months)
pub fn fn_edate(args: &[FormulaValue]) -> FnResult {
    let date = date_arg(args, 0)?;
    let months = int_arg(args, 1)?;
    serial(add_months(date, months as i64)?)
}

/// EOMONTH(start_date, months)
pub fn fn_eomonth(args: &[FormulaValue]) -> FnResult {
    let date = date_arg(args, 0)?;
    let months = int_arg(args, 1)?;
    let first = date.with_day(1).ok_or_else(|| num_error("date out of range"))?;
    let last = add_months(first, months as i64 + 1)?
        .pred_opt()
        .ok_or_else(|| num_error("date out of range"))?;
    if serial_from_date(last) < 0.0 {
        return Err(num_error("date out of range"));
    }
    serial(last)
}

/// Holiday serials from an optional array argument
fn holidays(args: &[FormulaValue], index: usize) -> Result<BTreeSet<NaiveDate>, CellError> {
    let mut dates = BTreeSet::new();
    if let Some(value) = args.get(index) {
        for holiday in flat(value) {
            match holiday {
                FormulaValue::Blank => {}
                FormulaValue::Error(e) => return Err(e.clone()),
                other => {
                    dates.insert(date_arg(std::slice::from_ref(other), 0)?);
                }
            }
        }
    }
    Ok(dates)
}

fn is_workday(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// NETWORKDAYS(start_date, end_date, [holidays])
pub fn fn_networkdays(args: &[FormulaValue]) -> FnResult {
    let start = date_arg(args, 0)?;
    let end = date_arg(args, 1)?;
    let holidays = holidays(args, 2)?;

    let (from, to, sign) = if start <= end {
        (start, end, 1.0)
    } else {
        (end, start, -1.0)
    };
    let count = from
        .iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| is_workday(*d, &holidays))
        .count();
    Ok(FormulaValue::Number(sign * count as f64))
}

/// WORKDAY(start_date, days, [holidays])
pub fn fn_workday(args: &[FormulaValue]) -> FnResult {
    let mut date = date_arg(args, 0)?;
    let days = int_arg(args, 1)?;
    let holidays = holidays(args, 2)?;

    if days.abs() > MAX_SERIAL {
        return Err(num_error("days out of range"));
    }

    let mut remaining = days.abs() as u64;
    while remaining > 0 {
        let next = if days > 0.0 {
            date.succ_opt()
        } else {
            date.pred_opt()
        };
        date = next
            .filter(|d| (0.0..=MAX_SERIAL).contains(&serial_from_date(*d)))
            .ok_or_else(|| num_error("date out of range"))?;
        if is_workday(date, &holidays) {
            remaining -= 1;
        }
    }
    serial(date)
}

/// Day count between two dates on a 30-day-month calendar
fn days_360(start: NaiveDate, end: NaiveDate, european: bool) -> i64 {
    let (mut d1, mut d2) = (start.day() as i64, end.day() as i64);
    if european {
        d1 = d1.min(30);
        d2 = d2.min(30);
    } else {
        let start_feb_end = start.month() == 2 && last_day_of_month(start);
        let end_feb_end = end.month() == 2 && last_day_of_month(end);
        if start_feb_end && end_feb_end {
            d2 = 30;
        }
        if start_feb_end || d1 == 31 {
            d1 = 30;
        }
        if d1 == 30 && d2 == 31 {
            d2 = 30;
        }
    }
    (end.year() - start.year()) as i64 * 360 + (end.month() as i64 - start.month() as i64) * 30 + d2 - d1
}

/// Year length used by the actual/actual basis
fn actual_year_length(start: NaiveDate, end: NaiveDate) -> f64 {
    let (y1, y2) = (start.year(), end.year());
    if y1 == y2 {
        return days_in_year(y1) as f64;
    }

    let within_a_year = y2 == y1 + 1 && (end.month(), end.day()) <= (start.month(), start.day());
    if within_a_year {
        let feb29_in = |year: i32| {
            NaiveDate::from_ymd_opt(year, 2, 29).map_or(false, |leap| start <= leap && leap <= end)
        };
        return if feb29_in(y1) || feb29_in(y2) { 366.0 } else { 365.0 };
    }

    let total: i64 = (y1..=y2).map(days_in_year).sum();
    total as f64 / (y2 - y1 + 1) as f64
}

/// YEARFRAC(start_date, end_date, [basis])
pub fn fn_yearfrac(args: &[FormulaValue]) -> FnResult {
    let mut start = date_arg(args, 0)?;
    let mut end = date_arg(args, 1)?;
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    let actual = (end - start).num_days() as f64;

    let fraction = match opt_int(args, 2, 0.0)? as i64 {
        0 => days_360(start, end, false) as f64 / 360.0,
        1 => actual / actual_year_length(start, end),
        2 => actual / 360.0,
        3 => actual / 365.0,
        4 => days_360(start, end, true) as f64 / 360.0,
        basis => return Err(num_error(format!("invalid basis {}", basis))),
    };
    Ok(FormulaValue::Number(fraction))
}

/// DAYS(end_date, start_date)
pub fn fn_days(args: &[FormulaValue]) -> FnResult {
    let end = date_arg(args, 0)?;
    let start = date_arg(args, 1)?;
    Ok(FormulaValue::Number((end - start).num_days() as f64))
}

/// Whole months from `start` to `end` (end >= start)
fn whole_months(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = (end.year() - start.year()) as i64 * 12 + end.month() as i64 - start.month() as i64;
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// DATEDIF(start_date, end_date, unit)
pub fn fn_datedif(args: &[FormulaValue]) -> FnResult {
    let start = date_arg(args, 0)?;
    let end = date_arg(args, 1)?;
    let unit = text_arg(args, 2)?.trim().to_ascii_uppercase();
    if start > end {
        return Err(num_error("start_date is after end_date"));
    }

    let months = whole_months(start, end);
    let n = match unit.as_str() {
        "Y" => months / 12,
        "M" => months,
        "D" => (end - start).num_days(),
        "YM" => months % 12,
        "MD" => {
            // Days since the last whole month
            let anchor = add_months(start, months)?;
            (end - anchor).num_days()
        }
        "YD" => {
            let anchor = add_months(start, months / 12 * 12)?;
            (end - anchor).num_days()
        }
        _ => return Err(num_error(format!("unknown unit '{}'", unit))),
    };
    Ok(FormulaValue::Number(n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{approx, eval, num};
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    #[test]
    fn test_serial_epoch() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(serial_from_date(date), 45306.0);
        assert_eq!(date_from_serial(45306.75).unwrap(), date);
        assert_eq!(date_from_serial(0.0).unwrap(), epoch());
        assert!(date_from_serial(-1.0).is_err());
    }

    #[test]
    fn test_parse_date_text() {
        assert_eq!(parse_date_text("2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_date_text("2024-1-5T10:30"), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_date_text("2024-02-30"), None);
        assert_eq!(parse_date_text("15/01/2024"), None);
    }

    #[test]
    fn test_date_normalizes_overflow() {
        assert_eq!(eval("=DATE(2024,1,15)"), num(45306.0));
        assert_eq!(eval("=DATE(2024,13,1)"), num(45658.0));
        assert_eq!(eval("=DATE(2024,3,0)"), num(45351.0));
        assert_eq!(eval("=DATE(99,1,1)"), num(36161.0));
        assert_eq!(eval("=DATE(10000,1,1)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_datevalue_and_parts() {
        assert_eq!(eval("=DATEVALUE(\"2024-01-15\")"), num(45306.0));
        assert_eq!(eval("=DATEVALUE(\"2024-02-30\")"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=DATEVALUE(45306)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=YEAR(\"2024-01-15\")"), num(2024.0));
        assert_eq!(eval("=MONTH(45306)"), num(1.0));
        assert_eq!(eval("=DAY(45306)"), num(15.0));
        assert_eq!(eval("=YEAR(-1)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=DAY(\"soon\")"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_weekday_and_weeknum() {
        // 2024-01-15 is a Monday
        assert_eq!(eval("=WEEKDAY(45306)"), num(2.0));
        assert_eq!(eval("=WEEKDAY(45306,2)"), num(1.0));
        assert_eq!(eval("=WEEKDAY(45306,3)"), num(0.0));
        assert_eq!(eval("=WEEKDAY(45306,17)"), num(2.0));
        assert_eq!(eval("=WEEKDAY(45306,9)"), err(ErrorKind::NumericError));
        assert_eq!(eval("=WEEKNUM(45306)"), num(3.0));
        assert_eq!(eval("=WEEKNUM(45306,21)"), num(3.0));
        assert_eq!(eval("=WEEKNUM(DATE(2024,1,1))"), num(1.0));
    }

    #[test]
    fn test_edate_eomonth() {
        assert_eq!(eval("=EDATE(DATE(2024,1,31),1)"), num(45351.0));
        assert_eq!(eval("=EDATE(DATE(2024,3,31),-1)"), num(45351.0));
        assert_eq!(eval("=EOMONTH(DATE(2024,1,15),1)"), num(45351.0));
        assert_eq!(eval("=EOMONTH(DATE(2024,1,15),-1)"), num(45291.0));
    }

    #[test]
    fn test_networkdays_and_workday() {
        assert_eq!(eval("=NETWORKDAYS(DATE(2024,1,1),DATE(2024,1,31))"), num(23.0));
        assert_eq!(eval("=NETWORKDAYS(DATE(2024,1,1),DATE(2024,1,31),{45306})"), num(22.0));
        assert_eq!(eval("=NETWORKDAYS(DATE(2024,1,31),DATE(2024,1,1))"), num(-23.0));
        // A repeated or weekend holiday only removes a weekday once
        assert_eq!(
            eval("=NETWORKDAYS(DATE(2024,1,1),DATE(2024,1,31),{45306,45306,45311})"),
            num(22.0)
        );
        assert_eq!(eval("=WORKDAY(DATE(2024,1,5),1)"), num(45299.0));
        assert_eq!(eval("=WORKDAY(DATE(2024,1,8),-1)"), num(45296.0));
    }

    #[test]
    fn test_yearfrac_bases() {
        assert_eq!(eval("=YEARFRAC(DATE(2024,1,1),DATE(2024,7,1))"), num(0.5));
        approx(&eval("=YEARFRAC(DATE(2024,1,1),DATE(2024,7,1),1)"), 182.0 / 366.0);
        approx(&eval("=YEARFRAC(DATE(2024,1,1),DATE(2024,7,1),2)"), 182.0 / 360.0);
        approx(&eval("=YEARFRAC(DATE(2024,1,1),DATE(2024,7,1),3)"), 182.0 / 365.0);
        assert_eq!(eval("=YEARFRAC(DATE(2024,1,31),DATE(2024,3,31),4)"), num(60.0 / 360.0));
        assert_eq!(eval("=YEARFRAC(1,2,7)"), err(ErrorKind::NumericError));
    }

    #[test]
    fn test_days_and_datedif() {
        assert_eq!(eval("=DAYS(DATE(2024,3,1),DATE(2024,1,1))"), num(60.0));
        let start = "DATE(2020,2,15)";
        let end = "DATE(2024,1,10)";
        let dif = |unit: &str| eval(&format!("=DATEDIF({},{},\"{}\")", start, end, unit));
        assert_eq!(dif("Y"), num(3.0));
        assert_eq!(dif("M"), num(46.0));
        assert_eq!(dif("YM"), num(10.0));
        assert_eq!(dif("MD"), num(26.0));
        assert_eq!(dif("X"), err(ErrorKind::NumericError));
        assert_eq!(
            eval(&format!("=DATEDIF({},{},\"D\")", end, start)),
            err(ErrorKind::NumericError)
        );
    }
}
