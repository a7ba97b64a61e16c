//! Sheet type
//!
//! A sheet is built once per evaluation from caller-supplied headers and rows
//! and is not mutated while formulas are evaluated against it.

use crate::cell::{CellAddress, CellRange, CellValue};

/// Column headers plus a dense, row-major grid of cell values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Column headers (not required to be unique)
    headers: Vec<String>,
    /// Rows of values; rows may have different lengths
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a sheet whose first data row is sheet row 1 (index 0)
    ///
    /// Headers are kept as metadata only.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Create a sheet laid out like a table: when `headers` is non-empty it
    /// occupies row 1 and the data rows follow from row 2.
    pub fn from_table(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        if headers.is_empty() {
            return Self::new(headers, rows);
        }

        let mut grid = Vec::with_capacity(rows.len() + 1);
        grid.push(headers.iter().map(CellValue::text).collect());
        grid.extend(rows);
        Self {
            headers,
            rows: grid,
        }
    }

    /// An empty sheet with no headers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column headers
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows of the grid
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows in the grid
    pub fn row_count(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// Width of the widest row
    pub fn col_count(&self) -> u32 {
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        u32::try_from(widest).unwrap_or(u32::MAX)
    }

    /// Get a cell value by address; out-of-bounds cells are blank
    pub fn get(&self, addr: &CellAddress) -> CellValue {
        self.value_at(addr.row, addr.col)
    }

    /// Get a cell value by 0-based row/column; out-of-bounds cells are blank
    pub fn value_at(&self, row: u32, col: u32) -> CellValue {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .cloned()
            .unwrap_or(CellValue::Blank)
    }

    /// Set a cell value, growing the grid as needed
    pub fn set_value_at(&mut self, row: u32, col: u32, value: CellValue) {
        let (row, col) = (row as usize, col as usize);
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Blank);
        }
        cells[col] = value;
    }

    /// Find a column by header name (case-insensitive, first match)
    pub fn column_index(&self, header: &str) -> Option<u32> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(header.trim()))
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Bounding range of the populated grid, if any
    pub fn used_range(&self) -> Option<CellRange> {
        let rows = self.row_count();
        let cols = self.col_count();
        if rows == 0 || cols == 0 {
            return None;
        }
        Some(CellRange::from_indices(0, 0, rows - 1, cols - 1))
    }

    /// Iterate over every stored cell with its address, row-major
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, value)| (CellAddress::new(r as u32, c as u32), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Sheet {
        Sheet::new(
            vec!["Key".into(), "Value".into()],
            vec![
                vec![CellValue::from("a"), CellValue::from(1)],
                vec![CellValue::from("b")],
            ],
        )
    }

    #[test]
    fn test_get_in_bounds() {
        let sheet = sample();
        assert_eq!(sheet.value_at(0, 1), CellValue::Number(1.0));
        assert_eq!(
            sheet.get(&CellAddress::parse("A2").unwrap()),
            CellValue::from("b")
        );
    }

    #[test]
    fn test_out_of_bounds_is_blank() {
        let sheet = sample();
        assert_eq!(sheet.value_at(1, 1), CellValue::Blank);
        assert_eq!(sheet.value_at(50, 0), CellValue::Blank);
        assert_eq!(sheet.value_at(0, 9), CellValue::Blank);
    }

    #[test]
    fn test_dimensions() {
        let sheet = sample();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:B2");
        assert_eq!(Sheet::empty().used_range(), None);
    }

    #[test]
    fn test_from_table_puts_headers_first() {
        let sheet = Sheet::from_table(
            vec!["qty".into()],
            vec![vec![CellValue::from(4)], vec![CellValue::from(6)]],
        );
        assert_eq!(sheet.value_at(0, 0), CellValue::from("qty"));
        assert_eq!(sheet.value_at(2, 0), CellValue::Number(6.0));

        let bare = Sheet::from_table(vec![], vec![vec![CellValue::from(4)]]);
        assert_eq!(bare.value_at(0, 0), CellValue::Number(4.0));
    }

    #[test]
    fn test_column_index() {
        let sheet = sample();
        assert_eq!(sheet.column_index("value"), Some(1));
        assert_eq!(sheet.column_index("missing"), None);
    }

    #[test]
    fn test_set_value_grows_grid() {
        let mut sheet = Sheet::empty();
        sheet.set_value_at(2, 1, CellValue::from(true));
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.value_at(2, 1), CellValue::Boolean(true));
        assert_eq!(sheet.value_at(2, 0), CellValue::Blank);
    }
}
