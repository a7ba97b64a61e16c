//! Text functions
//!
//! Positions and lengths count characters, not bytes, and positions are
//! 1-based.

use super::criteria::wildcard_find;
use super::date::{parse_date_text, serial_from_date};
use super::{
    bool_arg, flat, int_arg, opt_int, text_arg, value_error, FnResult, FunctionCategory::Text,
    FunctionDef, Param,
};
use crate::value::{parse_numeric_text, FormulaValue};
use cellcalc_core::CellError;

/// Longest text REPT produces
const MAX_TEXT_LEN: usize = 32_767;

pub(crate) const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef::eager("LEFT", Text, 1, Some(2), &[Param::scalar("text"), Param::scalar("num_chars")], fn_left,
        "First num_chars characters of text (default 1). #VALUE! when num_chars is negative."),
    FunctionDef::eager("RIGHT", Text, 1, Some(2), &[Param::scalar("text"), Param::scalar("num_chars")], fn_right,
        "Last num_chars characters of text (default 1). #VALUE! when num_chars is negative."),
    FunctionDef::eager("MID", Text, 3, Some(3),
        &[Param::scalar("text"), Param::scalar("start_num"), Param::scalar("num_chars")], fn_mid,
        "num_chars characters of text starting at position start_num (1-based). #VALUE! when start_num < 1 or num_chars < 0."),
    FunctionDef::eager("LEN", Text, 1, Some(1), &[Param::scalar("text")], fn_len,
        "Number of characters in text. Numbers are measured as displayed, e.g. LEN(12.5) is 4."),
    FunctionDef::eager("TRIM", Text, 1, Some(1), &[Param::scalar("text")], fn_trim,
        "Removes leading and trailing spaces and collapses runs of inner spaces to one."),
    FunctionDef::eager("CONCATENATE", Text, 1, None, &[Param::scalar("text")], fn_concatenate,
        "Joins its arguments as text. Ranges are not accepted (#VALUE!); use CONCAT or TEXTJOIN for ranges.").repeating(1),
    FunctionDef::eager("CONCAT", Text, 1, None, &[Param::array("text")], fn_concat,
        "Joins its arguments as text, including every cell of ranges in row-major order.").repeating(1),
    FunctionDef::eager("TEXTJOIN", Text, 3, None,
        &[Param::scalar("delimiter"), Param::scalar("ignore_empty"), Param::array("text")], fn_textjoin,
        "Joins the text arguments and range cells with delimiter between them, skipping empty values when ignore_empty is TRUE.").repeating(1),
    FunctionDef::eager("SUBSTITUTE", Text, 3, Some(4),
        &[Param::scalar("text"), Param::scalar("old_text"), Param::scalar("new_text"), Param::scalar("instance_num")], fn_substitute,
        "Replaces old_text with new_text in text (case-sensitive): every occurrence, or only occurrence instance_num. #VALUE! when instance_num < 1."),
    FunctionDef::eager("REPLACE", Text, 4, Some(4),
        &[Param::scalar("old_text"), Param::scalar("start_num"), Param::scalar("num_chars"), Param::scalar("new_text")], fn_replace,
        "Replaces num_chars characters of old_text starting at start_num (1-based) with new_text. #VALUE! when start_num < 1 or num_chars < 0."),
    FunctionDef::eager("FIND", Text, 2, Some(3),
        &[Param::scalar("find_text"), Param::scalar("within_text"), Param::scalar("start_num")], fn_find,
        "1-based position of find_text in within_text, searching case-sensitively from start_num (default 1). #VALUE! when not found."),
    FunctionDef::eager("SEARCH", Text, 2, Some(3),
        &[Param::scalar("find_text"), Param::scalar("within_text"), Param::scalar("start_num")], fn_search,
        "1-based position of find_text in within_text, case-insensitive, with * and ? wildcards (~ escapes), from start_num (default 1). #VALUE! when not found."),
    FunctionDef::eager("UPPER", Text, 1, Some(1), &[Param::scalar("text")], fn_upper,
        "Converts text to upper case."),
    FunctionDef::eager("LOWER", Text, 1, Some(1), &[Param::scalar("text")], fn_lower,
        "Converts text to lower case."),
    FunctionDef::eager("PROPER", Text, 1, Some(1), &[Param::scalar("text")], fn_proper,
        "Capitalizes the first letter of each word and lower-cases the rest; any non-letter starts a new word."),
    FunctionDef::eager("REPT", Text, 2, Some(2), &[Param::scalar("text"), Param::scalar("number_times")], fn_rept,
        "Repeats text number_times times. #VALUE! when number_times is negative or the result exceeds 32767 characters."),
    FunctionDef::eager("EXACT", Text, 2, Some(2), &[Param::scalar("text1"), Param::scalar("text2")], fn_exact,
        "TRUE when the two texts are identical, comparing case-sensitively."),
    FunctionDef::eager("VALUE", Text, 1, Some(1), &[Param::scalar("text")], fn_value,
        "Converts text to a number: numeric text (optionally with a trailing %) or ISO date text as a serial number. #VALUE! otherwise."),
    FunctionDef::eager("CHAR", Text, 1, Some(1), &[Param::scalar("number")], fn_char,
        "Character with code number (1-255, Latin-1). #VALUE! outside that range."),
    FunctionDef::eager("CODE", Text, 1, Some(1), &[Param::scalar("text")], fn_code,
        "Code point of the first character of text. #VALUE! for empty text."),
];

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    s.chars().skip(start_1based.saturating_sub(1)).take(n).collect()
}

/// Character count argument; negative is `#VALUE!`
fn count_arg(args: &[FormulaValue], index: usize, default: f64) -> Result<usize, CellError> {
    let n = opt_int(args, index, default)?;
    if n < 0.0 {
        return Err(value_error("character count must not be negative"));
    }
    Ok(n as usize)
}

/// Start position argument; below 1 is `#VALUE!`
fn start_arg(args: &[FormulaValue], index: usize) -> Result<usize, CellError> {
    let n = opt_int(args, index, 1.0)?;
    if n < 1.0 {
        return Err(value_error("start position must be at least 1"));
    }
    Ok(n as usize)
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    Ok(FormulaValue::Text(take_left(&text, count_arg(args, 1, 1.0)?)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    Ok(FormulaValue::Text(take_right(&text, count_arg(args, 1, 1.0)?)))
}

/// MID(text, start_num, num_chars)
pub fn fn_mid(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let start = start_arg(args, 1)?;
    let count = count_arg(args, 2, 0.0)?;
    Ok(FormulaValue::Text(take_mid(&text, start, count)))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Number(text_arg(args, 0)?.chars().count() as f64))
}

/// TRIM(text)
pub fn fn_trim(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let trimmed: Vec<&str> = text.split(' ').filter(|word| !word.is_empty()).collect();
    Ok(FormulaValue::Text(trimmed.join(" ")))
}

/// CONCATENATE(text1, [text2], ...)
pub fn fn_concatenate(args: &[FormulaValue]) -> FnResult {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_text()?);
    }
    Ok(FormulaValue::Text(out))
}

/// CONCAT(text1, [text2], ...)
pub fn fn_concat(args: &[FormulaValue]) -> FnResult {
    let mut out = String::new();
    for value in args.iter().flat_map(flat) {
        out.push_str(&value.to_text()?);
    }
    Ok(FormulaValue::Text(out))
}

/// TEXTJOIN(delimiter, ignore_empty, text1, [text2], ...)
pub fn fn_textjoin(args: &[FormulaValue]) -> FnResult {
    let delimiter = text_arg(args, 0)?;
    let ignore_empty = bool_arg(args, 1)?;

    let mut parts = Vec::new();
    for value in args[2..].iter().flat_map(flat) {
        let text = value.to_text()?;
        if ignore_empty && text.is_empty() {
            continue;
        }
        parts.push(text);
    }
    Ok(FormulaValue::Text(parts.join(&delimiter)))
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
pub fn fn_substitute(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let old_text = text_arg(args, 1)?;
    let new_text = text_arg(args, 2)?;
    let instance = match args.get(3) {
        None | Some(FormulaValue::Blank) => None,
        Some(_) => {
            let n = int_arg(args, 3)?;
            if n < 1.0 {
                return Err(value_error("instance_num must be at least 1"));
            }
            Some(n as usize)
        }
    };

    if old_text.is_empty() {
        return Ok(FormulaValue::Text(text));
    }

    let Some(n) = instance else {
        return Ok(FormulaValue::Text(text.replace(&old_text, &new_text)));
    };

    // Replace only the nth occurrence
    match text.match_indices(&old_text).nth(n - 1) {
        Some((pos, _)) => {
            let mut result = String::with_capacity(text.len());
            result.push_str(&text[..pos]);
            result.push_str(&new_text);
            result.push_str(&text[pos + old_text.len()..]);
            Ok(FormulaValue::Text(result))
        }
        None => Ok(FormulaValue::Text(text)),
    }
}

/// REPLACE(old_text, start_num, num_chars, new_text)
pub fn fn_replace(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let start = start_arg(args, 1)?;
    let count = count_arg(args, 2, 0.0)?;
    let new_text = text_arg(args, 3)?;

    let mut result = take_left(&text, start - 1);
    result.push_str(&new_text);
    result.extend(text.chars().skip((start - 1).saturating_add(count)));
    Ok(FormulaValue::Text(result))
}

/// Arguments shared by FIND and SEARCH, with the 0-based start validated
/// against the text length
fn find_args(args: &[FormulaValue]) -> Result<(String, String, usize), CellError> {
    let find_text = text_arg(args, 0)?;
    let within_text = text_arg(args, 1)?;
    let start = start_arg(args, 2)?;
    if start > within_text.chars().count() + 1 {
        return Err(value_error("start_num is beyond the text"));
    }
    Ok((find_text, within_text, start - 1))
}

fn not_found(find_text: &str) -> CellError {
    value_error(format!("'{}' not found", find_text))
}

/// FIND(find_text, within_text, [start_num])
pub fn fn_find(args: &[FormulaValue]) -> FnResult {
    let (find_text, within_text, start) = find_args(args)?;

    let search_str: String = within_text.chars().skip(start).collect();
    let byte_pos = search_str
        .find(&find_text)
        .ok_or_else(|| not_found(&find_text))?;
    let char_pos = search_str[..byte_pos].chars().count();
    Ok(FormulaValue::Number((start + char_pos + 1) as f64))
}

/// SEARCH(find_text, within_text, [start_num])
pub fn fn_search(args: &[FormulaValue]) -> FnResult {
    let (find_text, within_text, start) = find_args(args)?;
    let position = wildcard_find(&find_text, &within_text, start).ok_or_else(|| not_found(&find_text))?;
    Ok(FormulaValue::Number((position + 1) as f64))
}

pub fn fn_upper(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Text(text_arg(args, 0)?.to_uppercase()))
}

pub fn fn_lower(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Text(text_arg(args, 0)?.to_lowercase()))
}

/// PROPER(text)
pub fn fn_proper(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let mut result = String::with_capacity(text.len());
    let mut capitalize_next = true;

    for ch in text.chars() {
        if !ch.is_alphabetic() {
            result.push(ch);
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.extend(ch.to_lowercase());
        }
    }
    Ok(FormulaValue::Text(result))
}

/// REPT(text, number_times)
pub fn fn_rept(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let times = int_arg(args, 1)?;
    if times < 0.0 {
        return Err(value_error("number_times must not be negative"));
    }
    if text.chars().count() as f64 * times > MAX_TEXT_LEN as f64 {
        return Err(value_error(format!("result would exceed {} characters", MAX_TEXT_LEN)));
    }
    Ok(FormulaValue::Text(text.repeat(times as usize)))
}

/// EXACT(text1, text2)
pub fn fn_exact(args: &[FormulaValue]) -> FnResult {
    Ok(FormulaValue::Boolean(text_arg(args, 0)? == text_arg(args, 1)?))
}

/// VALUE(text)
pub fn fn_value(args: &[FormulaValue]) -> FnResult {
    match &args[0] {
        FormulaValue::Text(text) => parse_numeric_text(text)
            .or_else(|| parse_date_text(text).map(serial_from_date))
            .map(FormulaValue::Number)
            .ok_or_else(|| value_error(format!("'{}' is not a number", text))),
        other => other.to_number().map(FormulaValue::Number),
    }
}

/// CHAR(number)
pub fn fn_char(args: &[FormulaValue]) -> FnResult {
    let code = int_arg(args, 0)?;
    if !(1.0..=255.0).contains(&code) {
        return Err(value_error("code must be between 1 and 255"));
    }
    char::from_u32(code as u32)
        .map(|c| FormulaValue::Text(c.to_string()))
        .ok_or_else(|| value_error("invalid character code"))
}

/// CODE(text)
pub fn fn_code(args: &[FormulaValue]) -> FnResult {
    let text = text_arg(args, 0)?;
    let first = text.chars().next().ok_or_else(|| value_error("text is empty"))?;
    Ok(FormulaValue::Number(f64::from(u32::from(first))))
}

#[cfg(test)]
mod tests {
    use crate::test_util::{eval, eval_with, grid, num};
    use crate::FormulaValue;
    use cellcalc_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> FormulaValue {
        FormulaValue::text(s)
    }

    fn err(kind: ErrorKind) -> FormulaValue {
        FormulaValue::error(kind)
    }

    #[test]
    fn test_left_right_mid() {
        assert_eq!(eval("=LEFT(\"héllo\",2)"), text("hé"));
        assert_eq!(eval("=LEFT(\"hello\")"), text("h"));
        assert_eq!(eval("=RIGHT(\"hello\",3)"), text("llo"));
        assert_eq!(eval("=RIGHT(\"hi\",5)"), text("hi"));
        assert_eq!(eval("=MID(\"spreadsheet\",7,5)"), text("sheet"));
        assert_eq!(eval("=MID(\"abc\",0,1)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=LEFT(\"abc\",-1)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_len_trim_case() {
        assert_eq!(eval("=LEN(12.5)"), num(4.0));
        assert_eq!(eval("=LEN(\"\")"), num(0.0));
        assert_eq!(eval("=TRIM(\"  a   b  \")"), text("a b"));
        assert_eq!(eval("=UPPER(\"abc\")"), text("ABC"));
        assert_eq!(eval("=LOWER(\"ABC\")"), text("abc"));
        assert_eq!(eval("=PROPER(\"hello wORLD o'neil\")"), text("Hello World O'Neil"));
    }

    #[test]
    fn test_joining() {
        let sheet = grid(&[&["a", "", "c"]]);
        assert_eq!(eval("=CONCATENATE(\"a\",1,TRUE)"), text("a1TRUE"));
        assert_eq!(eval_with(&sheet, "=CONCATENATE(A1:C1)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval_with(&sheet, "=CONCAT(A1:C1,\"!\")"), text("ac!"));
        assert_eq!(eval_with(&sheet, "=TEXTJOIN(\"-\",TRUE,A1:C1)"), text("a-c"));
        assert_eq!(eval_with(&sheet, "=TEXTJOIN(\"-\",FALSE,A1:C1)"), text("a--c"));
    }

    #[test]
    fn test_substitute_replace() {
        assert_eq!(eval("=SUBSTITUTE(\"a-b-c\",\"-\",\"+\")"), text("a+b+c"));
        assert_eq!(eval("=SUBSTITUTE(\"a-b-c\",\"-\",\"+\",2)"), text("a-b+c"));
        assert_eq!(eval("=SUBSTITUTE(\"a-b-c\",\"-\",\"+\",5)"), text("a-b-c"));
        assert_eq!(eval("=SUBSTITUTE(\"abc\",\"b\",\"x\",0)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=REPLACE(\"abcdef\",2,3,\"XY\")"), text("aXYef"));
    }

    #[test]
    fn test_find_search() {
        assert_eq!(eval("=FIND(\"b\",\"abcb\")"), num(2.0));
        assert_eq!(eval("=FIND(\"b\",\"abcb\",3)"), num(4.0));
        assert_eq!(eval("=FIND(\"B\",\"abc\")"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=SEARCH(\"B\",\"abc\")"), num(2.0));
        assert_eq!(eval("=SEARCH(\"c?e\",\"abcdef\")"), num(3.0));
        assert_eq!(eval("=SEARCH(\"x\",\"abc\")"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=FIND(\"a\",\"abc\",9)"), err(ErrorKind::InvalidValue));
    }

    #[test]
    fn test_misc_text() {
        assert_eq!(eval("=REPT(\"ab\",3)"), text("ababab"));
        assert_eq!(eval("=REPT(\"ab\",-1)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=EXACT(\"a\",\"A\")"), FormulaValue::Boolean(false));
        assert_eq!(eval("=VALUE(\" 42 \")"), num(42.0));
        assert_eq!(eval("=VALUE(\"2024-01-15\")"), num(45306.0));
        assert_eq!(eval("=VALUE(\"abc\")"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=CHAR(65)"), text("A"));
        assert_eq!(eval("=CHAR(0)"), err(ErrorKind::InvalidValue));
        assert_eq!(eval("=CODE(\"A\")"), num(65.0));
        assert_eq!(eval("=CODE(\"\")"), err(ErrorKind::InvalidValue));
    }
}
