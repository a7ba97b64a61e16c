//! Cell address and range types

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Columns are letters (A-XFD) and rows are numbers (1-1048576) in text form;
/// both are stored 0-based. The optional `$` markers are kept so a parsed
/// formula can be written back the way it was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index, 0-based
    pub row: u32,
    /// Column index, 0-based (A=0, XFD=16383)
    pub col: u32,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

/// The parts of A1 text: `$`, letters, `$`, digits
struct A1Parts<'a> {
    col_absolute: bool,
    letters: &'a str,
    row_absolute: bool,
    digits: &'a str,
}

impl<'a> A1Parts<'a> {
    fn split(text: &'a str) -> Self {
        let (col_absolute, rest) = strip_dollar(text);
        let end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(end);
        let (row_absolute, digits) = strip_dollar(rest);
        Self {
            col_absolute,
            letters,
            row_absolute,
            digits,
        }
    }
}

fn strip_dollar(text: &str) -> (bool, &str) {
    match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

impl CellAddress {
    /// Relative address at `(row, col)`
    pub fn new(row: u32, col: u32) -> Self {
        Self::with_absolute(row, col, false, false)
    }

    pub fn with_absolute(row: u32, col: u32, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// `$A$1` style address
    pub fn absolute(row: u32, col: u32) -> Self {
        Self::with_absolute(row, col, true, true)
    }

    /// Whether the address lies inside the sheet limits
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use cellcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let parts = A1Parts::split(text);

        if parts.letters.is_empty() {
            return Err(Error::address(text, "missing column letters"));
        }
        if parts.digits.is_empty() || !parts.digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::address(text, "missing or malformed row number"));
        }

        let col = Self::letters_to_column(parts.letters)?;
        // Saturates long digit strings so they report as out of bounds
        let row = parts.digits.bytes().fold(0u64, |acc, b| {
            (acc * 10 + u64::from(b - b'0')).min(u64::from(u32::MAX))
        });
        if row == 0 {
            return Err(Error::address(text, "rows are numbered from 1"));
        }
        if row > u64::from(MAX_ROWS) {
            return Err(Error::RowOutOfBounds { row });
        }

        Ok(Self::with_absolute(
            (row - 1) as u32,
            col,
            parts.row_absolute,
            parts.col_absolute,
        ))
    }

    /// Column letters for a 0-based index (0 = A, 26 = AA)
    pub fn column_to_letters(col: u32) -> String {
        let mut letters = Vec::new();
        let mut rest = u64::from(col) + 1;
        while rest > 0 {
            rest -= 1;
            letters.push(b'A' + (rest % 26) as u8);
            rest /= 26;
        }
        letters.iter().rev().map(|&b| char::from(b)).collect()
    }

    /// 0-based index for column letters, case-insensitive
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::address(letters, "missing column letters"));
        }
        let number = letters.bytes().try_fold(0u32, |acc, b| {
            if !b.is_ascii_alphabetic() {
                return Err(Error::address(letters, "column letters must be A-Z"));
            }
            let next = acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
            if next > MAX_COLS {
                return Err(Error::ColumnOutOfBounds {
                    letters: letters.to_ascii_uppercase(),
                });
            }
            Ok(next)
        })?;
        Ok(number - 1)
    }

    /// A1-style text, with `$` markers where absolute
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollar = |absolute: bool| if absolute { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            dollar(self.col_absolute),
            Self::column_to_letters(self.col),
            dollar(self.row_absolute),
            u64::from(self.row) + 1
        )
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
///
/// Always normalized: `start` is the top-left corner and `end` the
/// bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range spanning two corners given in any order
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let ((top, top_abs), (bottom, bottom_abs)) =
            ordered((a.row, a.row_absolute), (b.row, b.row_absolute));
        let ((left, left_abs), (right, right_abs)) =
            ordered((a.col, a.col_absolute), (b.col, b.col_absolute));

        Self {
            start: CellAddress::with_absolute(top, left, top_abs, left_abs),
            end: CellAddress::with_absolute(bottom, right, bottom_abs, right_abs),
        }
    }

    pub fn from_indices(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse `A1:B10`, or a single address as a one-cell range
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let corner = |part: &str| {
            CellAddress::parse(part).map_err(|e| Error::InvalidRange {
                text: text.to_string(),
                source: Box::new(e),
            })
        };

        match text.split_once(':') {
            Some((start, end)) => Ok(Self::new(corner(start)?, corner(end)?)),
            None => Ok(Self::single(CellAddress::parse(text)?)),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.row_count() == 1 && self.col_count() == 1
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Every address in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> {
        let (left, right) = (self.start.col, self.end.col);
        (self.start.row..=self.end.row)
            .flat_map(move |row| (left..=right).map(move |col| CellAddress::new(row, col)))
    }

    /// `A1:B10` text; a one-cell range prints as its address
    pub fn to_a1_string(&self) -> String {
        self.to_string()
    }
}

fn ordered(a: (u32, bool), b: (u32, bool)) -> ((u32, bool), (u32, bool)) {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(1), "B");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(27), "AB");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("Z").unwrap(), 25);
        assert_eq!(CellAddress::letters_to_column("AA").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 701);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);

        // Case insensitive
        assert_eq!(CellAddress::letters_to_column("aa").unwrap(), 26);
    }

    #[test]
    fn test_column_encoding_is_bijective() {
        for col in 0..MAX_COLS {
            let letters = CellAddress::column_to_letters(col);
            assert_eq!(CellAddress::letters_to_column(&letters).unwrap(), col);
        }
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("B7").unwrap();
        assert_eq!((addr.row, addr.col), (6, 1));
        assert!(!addr.row_absolute);
        assert!(!addr.col_absolute);

        let addr = CellAddress::parse("$A1").unwrap();
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = CellAddress::parse("A$1").unwrap();
        assert!(!addr.col_absolute);
        assert!(addr.row_absolute);

        let addr = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!(addr.row, 1048575);
        assert_eq!(addr.col, 16383);
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert_eq!(
            CellAddress::parse("XFE1"),
            Err(Error::ColumnOutOfBounds {
                letters: "XFE".to_string()
            })
        );
        assert_eq!(
            CellAddress::parse("A1048577"),
            Err(Error::RowOutOfBounds { row: 1_048_577 })
        );
        assert!(matches!(
            CellRange::parse("A1:B0"),
            Err(Error::InvalidRange { .. })
        ));
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
        assert!(CellAddress::parse("A1B").is_err());
        assert!(CellAddress::parse("AAAAAAAAAAAAAAAAAAAAAAAA1").is_err());
        assert!(CellAddress::parse("A99999999999999999999").is_err());
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(CellAddress::absolute(0, 0).to_string(), "$A$1");
    }

    #[test]
    fn test_cell_range_normalizes() {
        let range = CellRange::parse("A10:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(9, 0));

        let range = CellRange::parse("C1:A3").unwrap();
        assert_eq!(range.to_a1_string(), "A1:C3");
    }

    #[test]
    fn test_cell_range_single() {
        let range = CellRange::parse("C3").unwrap();
        assert!(range.is_single_cell());
        assert_eq!(range.to_string(), "C3");
        assert_eq!(range.cell_count(), 1);
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2:D4").unwrap();

        assert!(range.contains(&CellAddress::new(1, 1)));
        assert!(range.contains(&CellAddress::new(3, 3)));
        assert!(range.contains(&CellAddress::new(2, 2)));

        assert!(!range.contains(&CellAddress::new(0, 0)));
        assert!(!range.contains(&CellAddress::new(4, 1)));
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(
            cells,
            vec![
                CellAddress::new(0, 0),
                CellAddress::new(0, 1),
                CellAddress::new(1, 0),
                CellAddress::new(1, 1),
            ]
        );
    }
}
