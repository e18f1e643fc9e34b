//! One-shot preprocess marker
//!
//! Preprocessing unmerges and overwrites cells, so running it twice would
//! corrupt the data. A hidden sheet records that it already ran:
//!
//! | Cell | Content |
//! |------|---------|
//! | `A1` | `"1"` once preprocessed |
//! | `A2` | local time of the run, `YYYY-MM-DD HH:MM:SS` |
//!
//! Files without the sheet are simply unprocessed.

use chrono::{Local, NaiveDateTime};
use claimsheet_core::{CellValue, Result, SheetState, Workbook};

/// Name of the hidden marker sheet
pub const META_SHEET_NAME: &str = "_PREPROCESS_META";

const DONE_CELL: (u32, u16) = (1, 1);
const TIMESTAMP_CELL: (u32, u16) = (2, 1);
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reads and writes the marker sheet
pub struct PreprocessGuard;

impl PreprocessGuard {
    /// True iff the marker sheet exists and its flag cell reads `1`
    pub fn is_preprocessed(workbook: &Workbook) -> bool {
        workbook
            .worksheet_by_name(META_SHEET_NAME)
            .map(|sheet| sheet.value_at(DONE_CELL.0, DONE_CELL.1).to_string().trim() == "1")
            .unwrap_or(false)
    }

    /// When the marker was written, if it carries a readable timestamp
    pub fn marked_at(workbook: &Workbook) -> Option<NaiveDateTime> {
        let sheet = workbook.worksheet_by_name(META_SHEET_NAME)?;
        match sheet.value_at(TIMESTAMP_CELL.0, TIMESTAMP_CELL.1) {
            CellValue::Date(dt) => Some(*dt),
            other => NaiveDateTime::parse_from_str(other.to_string().trim(), TIMESTAMP_FORMAT).ok(),
        }
    }

    /// Mark the workbook with the current local time
    pub fn mark(workbook: &mut Workbook) -> Result<()> {
        Self::mark_at(workbook, Local::now().naive_local())
    }

    /// Mark the workbook, creating the hidden sheet if needed
    pub fn mark_at(workbook: &mut Workbook, at: NaiveDateTime) -> Result<()> {
        let index = match workbook.sheet_index(META_SHEET_NAME) {
            Some(index) => index,
            None => {
                let index = workbook.add_worksheet_with_name(META_SHEET_NAME)?;
                log::debug!("created marker sheet {}", META_SHEET_NAME);
                index
            }
        };
        let Some(sheet) = workbook.worksheet_mut(index) else {
            return Ok(());
        };

        sheet.set_state(SheetState::Hidden);
        sheet.set_cell_value_at(DONE_CELL.0, DONE_CELL.1, "1")?;
        sheet.set_cell_value_at(
            TIMESTAMP_CELL.0,
            TIMESTAMP_CELL.1,
            at.format(TIMESTAMP_FORMAT).to_string(),
        )?;
        Ok(())
    }
}
