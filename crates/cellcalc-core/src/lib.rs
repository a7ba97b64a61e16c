//! # cellcalc-core
//!
//! Core data structures for the cellcalc formula engine.
//!
//! This crate provides the tabular data model formulas are evaluated against:
//! - [`CellValue`] - Cell values (numbers, text, booleans, blanks, errors)
//! - [`ErrorKind`] and [`CellError`] - Spreadsheet error values (`#DIV/0!`, `#N/A`, ...)
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing and rectangular ranges
//! - [`Sheet`] - Column headers plus a grid of values
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{CellAddress, CellValue, Sheet};
//!
//! let sheet = Sheet::new(
//!     vec!["name".to_string(), "qty".to_string()],
//!     vec![
//!         vec![CellValue::from("apples"), CellValue::from(3)],
//!         vec![CellValue::from("pears"), CellValue::from(5)],
//!     ],
//! );
//!
//! let addr = CellAddress::parse("B2").unwrap();
//! assert_eq!(sheet.get(&addr), CellValue::Number(5.0));
//! ```

pub mod cell;
pub mod error;
pub mod sheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellError, CellRange, CellValue, ErrorKind, SharedString};
pub use error::{Error, Result};
pub use sheet::Sheet;

/// Maximum number of rows in a sheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
