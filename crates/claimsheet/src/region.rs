//! Data region detection
//!
//! Claim sheets end with decorative rows, notes and summary blocks that are
//! sparse but not empty. The region ends where the anchor column goes blank
//! for a long run, not at the sheet's last used row.

use claimsheet_core::Worksheet;

/// Finds the real data rows of a sheet by looking at one anchor column
#[derive(Debug, Clone, Copy)]
pub struct DataRegionDetector<'a> {
    sheet: &'a Worksheet,
    anchor_col: u16,
}

impl<'a> DataRegionDetector<'a> {
    pub fn new(sheet: &'a Worksheet, anchor_col: u16) -> Self {
        Self { sheet, anchor_col }
    }

    fn is_blank(&self, row: u32) -> bool {
        self.sheet.value_at(row, self.anchor_col).is_blank()
    }

    /// Last data row at or after `start_row`.
    ///
    /// The first run of `empty_run` consecutive blank anchor cells ends the
    /// region just above the run. Without such a run the sheet's last row is
    /// used. Never returns less than `start_row`.
    pub fn guess_last_row(&self, start_row: u32, empty_run: u32) -> u32 {
        let empty_run = empty_run.max(1);
        let max_row = self.sheet.max_row();
        let mut streak = 0;

        for row in start_row..=max_row {
            if self.is_blank(row) {
                streak += 1;
                if streak >= empty_run {
                    return (row - empty_run).max(start_row);
                }
            } else {
                streak = 0;
            }
        }

        max_row.max(start_row)
    }

    /// Rows in `start..=end` whose anchor cell is non-blank
    pub fn data_rows(&self, start: u32, end: u32) -> Vec<u32> {
        (start..=end).filter(|&row| !self.is_blank(row)).collect()
    }
}
