//! Merged column expansion
//!
//! A vehicle type is often merged down across all of a claim's rows. Before
//! rows can be filtered or evaluated individually, each row needs its own
//! copy of the value.

use claimsheet_core::{CellRange, Result, Worksheet};

/// Unmerges and fills one column of the data region
#[derive(Debug, Clone, Copy)]
pub struct MergedColumnNormalizer {
    pub column: u16,
    pub data_start_row: u32,
    pub last_row: u32,
}

impl MergedColumnNormalizer {
    pub fn new(column: u16, data_start_row: u32, last_row: u32) -> Self {
        Self {
            column,
            data_start_row,
            last_row,
        }
    }

    /// Run both passes. Returns the number of merged regions removed.
    pub fn normalize(&self, sheet: &mut Worksheet) -> Result<usize> {
        let expanded = self.expand_merges(sheet)?;
        self.forward_fill(sheet)?;
        Ok(expanded)
    }

    /// Unmerge every region crossing the column that starts inside the data
    /// region, copying its anchor value into each of its rows up to
    /// `last_row`.
    fn expand_merges(&self, sheet: &mut Worksheet) -> Result<usize> {
        let targets: Vec<CellRange> = sheet
            .merged_regions()
            .iter()
            .filter(|r| {
                r.start.col <= self.column
                    && self.column <= r.end.col
                    && r.start.row >= self.data_start_row
            })
            .copied()
            .collect();

        for range in &targets {
            let value = sheet.value_at(range.start.row, range.start.col).clone();
            sheet.unmerge_cells(range);
            for row in range.start.row..=range.end.row.min(self.last_row) {
                sheet.set_merged_value_at(row, self.column, value.clone())?;
            }
        }

        Ok(targets.len())
    }

    /// Fill remaining blanks from the nearest non-blank value above
    fn forward_fill(&self, sheet: &mut Worksheet) -> Result<()> {
        let mut previous = None;

        for row in self.data_start_row..=self.last_row {
            let current = sheet.value_at(row, self.column);
            if !current.is_blank() {
                previous = Some(current.clone());
            } else if let Some(value) = &previous {
                sheet.set_merged_value_at(row, self.column, value.clone())?;
            }
        }

        Ok(())
    }
}
