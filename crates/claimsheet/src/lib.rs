//! # claimsheet
//!
//! Preprocessing and live display for warranty chargeback spreadsheets.
//!
//! A claims export is cleaned up once ([`preprocess`]):
//!
//! - header columns are located by keyword ([`ColumnLocator`])
//! - the data region is found by an empty-run heuristic ([`DataRegionDetector`])
//! - the vehicle column is unmerged and filled ([`MergedColumnNormalizer`])
//! - over-mileage and out-of-warranty claims get a 0 rate ([`WarrantyEvaluator`])
//! - chargeback formulas and totals are written ([`FormulaSynthesizer`])
//! - a hidden marker sheet stops a second run ([`PreprocessGuard`])
//!
//! A [`Session`] then backs an interactive grid: edits land in an overlay with
//! undo/redo, and every display request evaluates formulas against the
//! overlay and the active [`RowFilter`].
//!
//! ## Example
//!
//! ```rust
//! use claimsheet::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! for (col, header) in ["Vehicle", "Mileage", "Sale Date", "Repair Date", "Occurrence", "Rate", "Chargeback"]
//!     .iter()
//!     .enumerate()
//! {
//!     sheet.set_cell_value_at(3, col as u16 + 1, *header).unwrap();
//! }
//! sheet.set_cell_value("A4", "SUV").unwrap();
//! sheet.set_cell_value("B4", 12000).unwrap();
//! sheet.set_cell_value("D4", "2024-03-01").unwrap();
//! sheet.set_cell_value("E4", 200000).unwrap();
//! sheet.set_cell_value("F4", 50).unwrap();
//!
//! let report = preprocess(&mut workbook, &PreprocessConfig::default()).unwrap();
//! assert_eq!(report.data_rows, vec![4]);
//!
//! let session = Session::new(workbook, PreprocessConfig::default()).unwrap();
//! assert_eq!(session.display_value(4, 7), "100,000");
//! ```

pub mod columns;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod grid;
pub mod guard;
pub mod normalize;
pub mod parse;
pub mod prelude;
pub mod preprocess;
pub mod region;
pub mod session;
pub mod synthesize;
pub mod task;
pub mod warranty;

pub use columns::{ColumnLayout, ColumnLocator, MatchMode};
pub use config::{HeaderKeywords, PreprocessConfig, SummaryLabels};
pub use display::{format_display, parse_user_input};
pub use error::{Error, PreprocessError, Result};
pub use filter::{FilteredRows, RowFilter, BLANK_TOKEN};
pub use grid::{EditRecord, EditableColumns, GridModel, GridView, InvalidEdit};
pub use guard::{PreprocessGuard, META_SHEET_NAME};
pub use normalize::MergedColumnNormalizer;
pub use preprocess::{preprocess, PreprocessReport};
pub use region::DataRegionDetector;
pub use session::{PendingPreprocess, PreprocessOutcome, Session};
pub use synthesize::{FormulaColumns, FormulaSynthesizer};
pub use task::BackgroundTask;
pub use warranty::{set_rate, ChangedRowSet, WarrantyColumns, WarrantyEvaluator};

pub use claimsheet_core::{
    CellAddress, CellRange, CellValue, Color, FillStyle, MergeIndex, NumberFormat, SheetState,
    Style, Workbook, Worksheet,
};
pub use claimsheet_formula::{AllRowsVisible, CellSource, FormulaEvaluator, RowVisibility};
pub use claimsheet_xlsx::{XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// File I/O for [`Workbook`]
pub trait WorkbookExt {
    /// Open a workbook, picking the reader by extension
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook, picking the writer by extension
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("xlsx") | Some("xlsm") => {
                let workbook = XlsxReader::read_file(path)?;
                log::info!("opened {} ({} sheet(s))", path.display(), workbook.sheet_count());
                Ok(workbook)
            }
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxWriter::write_file(self, path)?;
                log::info!("saved {}", path.display());
                Ok(())
            }
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
