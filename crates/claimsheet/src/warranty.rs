//! Mileage and warranty-period rules
//!
//! A claim outside the mileage limit or the warranty period cannot be
//! charged back to the supplier: its rate drops to 0 and the offending cells
//! are highlighted for review.

use std::collections::BTreeSet;

use claimsheet_core::{CellValue, Color, FillStyle, MergeIndex, Result, Worksheet};

use crate::parse::{days_between, parse_excel_date, parse_int_like};

/// Rows whose rate changed during one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedRowSet(BTreeSet<u32>);

impl ChangedRowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: u32) -> bool {
        self.0.insert(row)
    }

    pub fn contains(&self, row: u32) -> bool {
        self.0.contains(&row)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Columns the rules read and write
#[derive(Debug, Clone, Copy)]
pub struct WarrantyColumns {
    pub mileage: u16,
    pub sale_date: u16,
    pub repair_date: u16,
    pub rate: u16,
}

/// Applies the mileage and warranty-period thresholds to data rows
#[derive(Debug, Clone, Copy)]
pub struct WarrantyEvaluator {
    pub mileage_threshold: i64,
    pub warranty_days: i64,
    pub highlight: Color,
}

impl WarrantyEvaluator {
    pub fn new(mileage_threshold: i64, warranty_days: i64) -> Self {
        Self {
            mileage_threshold,
            warranty_days,
            highlight: Color::YELLOW,
        }
    }

    /// Evaluate every row. Reads and writes go through merge anchors.
    ///
    /// Each changed row gets its rate cell highlighted once, after all rules
    /// have run.
    pub fn evaluate(
        &self,
        sheet: &mut Worksheet,
        merges: &MergeIndex,
        rows: &[u32],
        cols: WarrantyColumns,
    ) -> Result<ChangedRowSet> {
        let mut changed = ChangedRowSet::new();

        for &row in rows {
            let read = |col: u16| {
                let (r, c) = merges.canonical(row, col);
                sheet.value_at(r, c).clone()
            };
            let mileage = read(cols.mileage);
            let sale = read(cols.sale_date);
            let repair = read(cols.repair_date);

            match parse_int_like(&mileage) {
                Some(km) if km >= self.mileage_threshold => {
                    self.highlight_cell(sheet, merges, row, cols.mileage)?;
                    set_rate(sheet, merges, row, cols.rate, 0.0, &mut changed)?;
                }
                Some(_) => {}
                None if !mileage.is_blank() => {
                    log::debug!("row {}: unparseable mileage {:?}", row, mileage)
                }
                None => {}
            }

            match (parse_excel_date(&sale), parse_excel_date(&repair)) {
                (Some(sold), Some(repaired)) => {
                    if days_between(sold, repaired) >= self.warranty_days {
                        self.highlight_cell(sheet, merges, row, cols.sale_date)?;
                        set_rate(sheet, merges, row, cols.rate, 0.0, &mut changed)?;
                    }
                }
                _ if !sale.is_blank() && !repair.is_blank() => {
                    log::debug!("row {}: unparseable date ({:?}, {:?})", row, sale, repair)
                }
                _ => {}
            }
        }

        for row in changed.iter() {
            self.highlight_cell(sheet, merges, row, cols.rate)?;
        }

        Ok(changed)
    }

    fn highlight_cell(
        &self,
        sheet: &mut Worksheet,
        merges: &MergeIndex,
        row: u32,
        col: u16,
    ) -> Result<()> {
        let (r, c) = merges.canonical(row, col);
        sheet.set_fill_at(r, c, FillStyle::solid(self.highlight))
    }
}

/// Write `rate` unless the cell already holds that number.
///
/// The comparison is numeric, so `"50"`, `"50.0"` and `50` are all equal and
/// a row already at the target rate is not reported as changed.
pub fn set_rate(
    sheet: &mut Worksheet,
    merges: &MergeIndex,
    row: u32,
    col: u16,
    rate: f64,
    changed: &mut ChangedRowSet,
) -> Result<()> {
    let (r, c) = merges.canonical(row, col);
    let current = sheet.value_at(r, c);
    let old = if current.is_blank() {
        None
    } else {
        current.as_lenient_number()
    };

    if old != Some(rate) {
        sheet.set_cell_value_at(r, c, CellValue::Number(rate))?;
        changed.insert(row);
    }
    Ok(())
}
