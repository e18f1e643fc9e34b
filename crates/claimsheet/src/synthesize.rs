//! Formula injection
//!
//! Writes the per-row chargeback formula, the unfiltered totals below the
//! data and the filter-aware SUBTOTAL cells above the header. Every address
//! goes through [`CellAddress`]; every write goes through merge anchors.

use claimsheet_core::{CellAddress, CellRange, CellValue, Result, Worksheet};

use crate::config::SummaryLabels;

/// Rows between the last data row and the first total row
const TOTALS_GAP: u32 = 3;

/// Columns the synthesized formulas refer to
#[derive(Debug, Clone, Copy)]
pub struct FormulaColumns {
    pub occurrence: u16,
    pub rate: u16,
    pub chargeback: u16,
}

/// Writes formulas over one data region
#[derive(Debug, Clone)]
pub struct FormulaSynthesizer<'a> {
    cols: FormulaColumns,
    labels: &'a SummaryLabels,
}

impl<'a> FormulaSynthesizer<'a> {
    pub fn new(cols: FormulaColumns, labels: &'a SummaryLabels) -> Self {
        Self { cols, labels }
    }

    /// `=<occurrence>*(<rate>/100)` into the chargeback column of each row
    pub fn write_row_formulas(&self, sheet: &mut Worksheet, rows: &[u32]) -> Result<()> {
        for &row in rows {
            let occurrence = CellAddress::new(row, self.cols.occurrence).to_a1_string();
            let rate = CellAddress::new(row, self.cols.rate).to_a1_string();
            sheet.set_merged_value_at(
                row,
                self.cols.chargeback,
                CellValue::formula(format!("{}*({}/100)", occurrence, rate)),
            )?;
        }
        Ok(())
    }

    /// Labelled `SUM` totals for the occurrence and chargeback columns.
    ///
    /// The occurrence total sits three rows below the last data row and the
    /// chargeback total on the row after it. Labels go in the column to the
    /// left; a total in column A gets no label.
    pub fn write_totals(&self, sheet: &mut Worksheet, rows: &[u32]) -> Result<()> {
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(()),
        };
        let total_row = last + TOTALS_GAP;

        for (offset, col, label) in [
            (0, self.cols.occurrence, &self.labels.occurrence),
            (1, self.cols.chargeback, &self.labels.chargeback),
        ] {
            let row = total_row + offset;
            if col > 1 {
                sheet.set_merged_value_at(row, col - 1, label.as_str())?;
            }
            sheet.set_merged_value_at(row, col, aggregate("SUM(", col, first, last))?;
        }
        Ok(())
    }

    /// `SUBTOTAL(109, …)` on `row` for the occurrence and chargeback columns,
    /// leaving any non-blank cell alone
    pub fn write_subtotals(&self, sheet: &mut Worksheet, row: u32, rows: &[u32]) -> Result<()> {
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(()),
        };

        for col in [self.cols.occurrence, self.cols.chargeback] {
            let (ar, ac) = sheet.merge_anchor(row, col);
            if !sheet.value_at(ar, ac).is_blank() {
                log::debug!("subtotal cell {} occupied", CellAddress::new(ar, ac));
                continue;
            }
            sheet.set_cell_value_at(ar, ac, aggregate("SUBTOTAL(109,", col, first, last))?;
        }
        Ok(())
    }
}

/// `<prefix><first>:<last>)` over one column
fn aggregate(prefix: &str, col: u16, first: u32, last: u32) -> CellValue {
    let range = CellRange::from_indices(first, col, last, col);
    CellValue::formula(format!("{}{})", prefix, range.to_a1_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COLS: FormulaColumns = FormulaColumns {
        occurrence: 5,
        rate: 6,
        chargeback: 7,
    };

    fn formula(sheet: &Worksheet, addr: &str) -> Option<String> {
        sheet.value(addr).unwrap().formula_text().map(str::to_string)
    }

    #[test]
    fn test_row_formulas() {
        let mut sheet = Worksheet::new("Claims");
        let labels = SummaryLabels::default();
        let synth = FormulaSynthesizer::new(COLS, &labels);
        synth.write_row_formulas(&mut sheet, &[4, 5, 9]).unwrap();

        assert_eq!(formula(&sheet, "G4").as_deref(), Some("=E4*(F4/100)"));
        assert_eq!(formula(&sheet, "G9").as_deref(), Some("=E9*(F9/100)"));
        assert_eq!(sheet.value("G6").unwrap(), &CellValue::Empty);
    }

    #[test]
    fn test_totals() {
        let mut sheet = Worksheet::new("Claims");
        let labels = SummaryLabels::default();
        FormulaSynthesizer::new(COLS, &labels)
            .write_totals(&mut sheet, &[4, 5, 9])
            .unwrap();

        assert_eq!(sheet.value("D12").unwrap().as_text(), Some("발생금액"));
        assert_eq!(formula(&sheet, "E12").as_deref(), Some("=SUM(E4:E9)"));
        assert_eq!(sheet.value("F13").unwrap().as_text(), Some("구상금액"));
        assert_eq!(formula(&sheet, "G13").as_deref(), Some("=SUM(G4:G9)"));
    }

    #[test]
    fn test_total_in_first_column_has_no_label() {
        let mut sheet = Worksheet::new("Claims");
        let labels = SummaryLabels::default();
        let cols = FormulaColumns {
            occurrence: 1,
            rate: 2,
            chargeback: 3,
        };
        FormulaSynthesizer::new(cols, &labels)
            .write_totals(&mut sheet, &[4])
            .unwrap();
        assert_eq!(formula(&sheet, "A7").as_deref(), Some("=SUM(A4:A4)"));
        assert_eq!(sheet.value("B8").unwrap().as_text(), Some("구상금액"));
    }

    #[test]
    fn test_subtotal_only_when_blank() {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("E2", "Total").unwrap();
        sheet.set_cell_value("G2", "  ").unwrap();
        let labels = SummaryLabels::default();
        FormulaSynthesizer::new(COLS, &labels)
            .write_subtotals(&mut sheet, 2, &[4, 8])
            .unwrap();

        assert_eq!(sheet.value("E2").unwrap().as_text(), Some("Total"));
        assert_eq!(formula(&sheet, "G2").as_deref(), Some("=SUBTOTAL(109,G4:G8)"));
    }

    #[test]
    fn test_empty_region_writes_nothing() {
        let mut sheet = Worksheet::new("Claims");
        let labels = SummaryLabels::default();
        let synth = FormulaSynthesizer::new(COLS, &labels);
        synth.write_totals(&mut sheet, &[]).unwrap();
        synth.write_subtotals(&mut sheet, 2, &[]).unwrap();
        assert_eq!(sheet.cell_count(), 0);
    }
}
