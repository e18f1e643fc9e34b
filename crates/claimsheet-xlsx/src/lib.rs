//! # claimsheet-xlsx
//!
//! XLSX reader and writer for claimsheet workbooks.
//!
//! Round-trips what the preprocessing engine reads and writes: cell values
//! and formulas, merged regions, hidden rows, sheet visibility, solid fills
//! and number formats. Fonts, borders and other presentation details are
//! not preserved.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

use std::path::Path;

use claimsheet_core::Workbook;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

/// Read an `.xlsx`/`.xlsm` file
pub fn read_xlsx<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
    XlsxReader::read_file(path)
}

/// Write a workbook to an `.xlsx` file
pub fn write_xlsx<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
    XlsxWriter::write_file(workbook, path)
}
