//! # claimsheet-core
//!
//! Worksheet model for the claimsheet preprocessing engine.
//!
//! - [`CellValue`] - Tagged cell values (number, text, boolean, date, formula)
//! - [`CellAddress`] and [`CellRange`] - 1-based coordinates and the A1 codec
//! - [`MergeIndex`] - Merged-cell anchor lookups
//! - [`Workbook`], [`Worksheet`] - The document structures
//!
//! ## Example
//!
//! ```rust
//! use claimsheet_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A4", "SUV").unwrap();
//! sheet.set_cell_value_at(4, 2, 70000).unwrap();
//! sheet.merge("A4:A6").unwrap();
//!
//! let merges = sheet.merge_index();
//! assert_eq!(merges.canonical(6, 1), (4, 1));
//! assert_eq!(sheet.value_at(4, 2), &CellValue::Number(70000.0));
//! ```

pub mod cell;
pub mod error;
pub mod merge;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{date, parse_lenient_number, CellAddress, CellData, CellRange, CellValue, SharedString};
pub use error::{Error, Result};
pub use merge::MergeIndex;
pub use style::{Color, FillStyle, NumberFormat, Style, StylePool};
pub use workbook::Workbook;
pub use worksheet::{SheetState, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;
