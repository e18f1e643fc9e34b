//! Formula evaluator
//!
//! Evaluates the supported formula shapes against a [`CellSource`]. The
//! evaluator is read-only: it never writes to the source.

use std::collections::HashSet;

use crate::ast::{DisplayFormula, SubtotalFunction};
use crate::error::{FormulaError, FormulaResult};
use crate::parser::parse_formula;
use claimsheet_core::{date, CellAddress, CellRange, CellValue, MergeIndex, Worksheet};

/// How many reference hops the evaluator follows before giving up
pub const MAX_DEPTH: usize = 32;

/// Read access to the cells a formula refers to
pub trait CellSource {
    /// Effective value at a position, already resolved through merges
    fn value(&self, row: u32, col: u16) -> CellValue;

    /// Merge anchor of a position
    fn canonical(&self, row: u32, col: u16) -> (u32, u16);

    /// Whether a row is manually hidden
    fn is_row_hidden(&self, _row: u32) -> bool {
        false
    }

    /// Last used row and column, used to clip whole-column ranges
    fn extent(&self) -> Option<(u32, u16)> {
        None
    }
}

/// Row filter consulted by SUBTOTAL
pub trait RowVisibility {
    /// False when the active filter hides the row
    fn is_row_visible(&self, row: u32) -> bool;
}

/// No filter: every row is visible
#[derive(Debug, Clone, Copy, Default)]
pub struct AllRowsVisible;

impl RowVisibility for AllRowsVisible {
    fn is_row_visible(&self, _row: u32) -> bool {
        true
    }
}

impl<F: Fn(u32) -> bool> RowVisibility for F {
    fn is_row_visible(&self, row: u32) -> bool {
        self(row)
    }
}

/// A worksheet read through its merged regions
pub struct WorksheetSource<'a> {
    sheet: &'a Worksheet,
    merges: MergeIndex,
}

impl<'a> WorksheetSource<'a> {
    /// Index the sheet's merges for lookups
    pub fn new(sheet: &'a Worksheet) -> Self {
        Self {
            sheet,
            merges: sheet.merge_index(),
        }
    }
}

impl CellSource for WorksheetSource<'_> {
    fn value(&self, row: u32, col: u16) -> CellValue {
        let (ar, ac) = self.merges.canonical(row, col);
        self.sheet.value_at(ar, ac).clone()
    }

    fn canonical(&self, row: u32, col: u16) -> (u32, u16) {
        self.merges.canonical(row, col)
    }

    fn is_row_hidden(&self, row: u32) -> bool {
        self.sheet.is_row_hidden(row)
    }

    fn extent(&self) -> Option<(u32, u16)> {
        Some((self.sheet.max_row(), self.sheet.max_col()))
    }
}

/// Display-time evaluator for one cell source and filter state
pub struct FormulaEvaluator<'a> {
    source: &'a dyn CellSource,
    visibility: &'a dyn RowVisibility,
}

impl<'a> FormulaEvaluator<'a> {
    /// Create an evaluator
    pub fn new(source: &'a dyn CellSource, visibility: &'a dyn RowVisibility) -> Self {
        Self { source, visibility }
    }

    /// Evaluate a raw cell value. Non-formula values come back unchanged.
    pub fn evaluate(&self, raw: &CellValue) -> FormulaResult<CellValue> {
        match raw {
            CellValue::Formula(text) => self.eval_text(text, 0),
            other => Ok(other.clone()),
        }
    }

    /// Evaluate for display: any failure yields the literal formula text.
    pub fn display(&self, raw: &CellValue) -> CellValue {
        match self.evaluate(raw) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("showing formula literally: {}", err);
                CellValue::text(raw.to_string())
            }
        }
    }

    /// Evaluate the cell at a position
    pub fn evaluate_cell(&self, row: u32, col: u16) -> FormulaResult<CellValue> {
        self.eval_cell(row, col, 0)
    }

    fn eval_text(&self, text: &str, depth: usize) -> FormulaResult<CellValue> {
        if depth > MAX_DEPTH {
            return Err(FormulaError::NestingTooDeep(MAX_DEPTH));
        }

        match parse_formula(text)? {
            DisplayFormula::Sum(range) => self.sum(&range, None, depth).map(CellValue::Number),
            DisplayFormula::Subtotal { function, range } => self
                .sum(&range, Some(function), depth)
                .map(CellValue::Number),
            DisplayFormula::Reference(addr) => self.eval_cell(addr.row, addr.col, depth + 1),
            DisplayFormula::ScaledProduct {
                amount,
                rate,
                divisor,
            } => {
                if divisor == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                let amount = self.operand(amount, depth)?;
                let rate = self.operand(rate, depth)?;
                Ok(CellValue::Number(amount * (rate / divisor)))
            }
        }
    }

    fn eval_cell(&self, row: u32, col: u16, depth: usize) -> FormulaResult<CellValue> {
        match self.source.value(row, col) {
            CellValue::Formula(text) => self.eval_text(&text, depth + 1),
            other => Ok(other),
        }
    }

    fn operand(&self, addr: CellAddress, depth: usize) -> FormulaResult<f64> {
        let value = self.eval_cell(addr.row, addr.col, depth + 1)?;
        match &value {
            CellValue::Empty => Ok(0.0),
            CellValue::Number(n) => Ok(*n),
            CellValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            CellValue::Date(d) => Ok(date::datetime_to_serial(*d)),
            CellValue::Text(_) if value.is_blank() => Ok(0.0),
            CellValue::Text(_) => value.as_lenient_number().ok_or_else(|| FormulaError::NotNumeric {
                address: addr.to_string(),
                value: value.to_string(),
            }),
            CellValue::Formula(text) => Err(FormulaError::Unsupported(text.clone())),
        }
    }

    /// Sum numbers in a range, counting each merged region once. With a
    /// SUBTOTAL function, rows are judged by the merge anchor's row and nested
    /// SUBTOTAL cells are skipped.
    fn sum(
        &self,
        range: &CellRange,
        subtotal: Option<SubtotalFunction>,
        depth: usize,
    ) -> FormulaResult<f64> {
        let range = self.clip(range);
        let mut seen = HashSet::new();
        let mut total = 0.0;

        for cell in range.iter().flat_map(|r| r.cells()) {
            let anchor = self.source.canonical(cell.row, cell.col);
            if !seen.insert(anchor) {
                continue;
            }

            if let Some(function) = subtotal {
                if !self.visibility.is_row_visible(anchor.0) {
                    continue;
                }
                if function == SubtotalFunction::SumVisible && self.source.is_row_hidden(anchor.0) {
                    continue;
                }
                if is_subtotal(&self.source.value(anchor.0, anchor.1)) {
                    continue;
                }
            }

            if let CellValue::Number(n) = self.eval_cell(anchor.0, anchor.1, depth + 1)? {
                total += n;
            }
        }

        Ok(total)
    }

    fn clip(&self, range: &CellRange) -> Option<CellRange> {
        match self.source.extent() {
            None => Some(*range),
            Some((max_row, max_col)) => {
                if range.start.row > max_row || range.start.col > max_col {
                    return None;
                }
                Some(CellRange::from_indices(
                    range.start.row,
                    range.start.col,
                    range.end.row.min(max_row),
                    range.end.col.min(max_col),
                ))
            }
        }
    }
}

fn is_subtotal(value: &CellValue) -> bool {
    matches!(
        value.formula_text().map(parse_formula),
        Some(Ok(DisplayFormula::Subtotal { .. }))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A1:A2 merged (value 5), A3 = 7, A4 = 11
    fn merged_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("A1", 5).unwrap();
        sheet.merge("A1:A2").unwrap();
        sheet.set_cell_value("A3", 7).unwrap();
        sheet.set_cell_value("A4", 11).unwrap();
        sheet
    }

    fn eval(sheet: &Worksheet, formula: &str, visibility: &dyn RowVisibility) -> CellValue {
        let source = WorksheetSource::new(sheet);
        FormulaEvaluator::new(&source, visibility).display(&CellValue::formula(formula))
    }

    #[test]
    fn test_sum_counts_merged_value_once() {
        let sheet = merged_sheet();
        assert_eq!(
            eval(&sheet, "=SUM(A1:A4)", &AllRowsVisible),
            CellValue::Number(23.0)
        );
        assert_eq!(
            eval(&sheet, "=SUM(A2:A4)", &AllRowsVisible),
            CellValue::Number(23.0)
        );
    }

    #[test]
    fn test_subtotal_skips_filtered_anchor_row() {
        let sheet = merged_sheet();
        let hide_first = |row: u32| row != 1;

        assert_eq!(
            eval(&sheet, "=SUBTOTAL(9,A1:A4)", &hide_first),
            CellValue::Number(18.0)
        );
        assert_eq!(
            eval(&sheet, "=SUM(A1:A4)", &hide_first),
            CellValue::Number(23.0)
        );
    }

    #[test]
    fn test_subtotal_109_skips_hidden_rows() {
        let mut sheet = merged_sheet();
        sheet.set_row_hidden(4, true);

        assert_eq!(
            eval(&sheet, "=SUBTOTAL(109,A1:A4)", &AllRowsVisible),
            CellValue::Number(12.0)
        );
        assert_eq!(
            eval(&sheet, "=SUBTOTAL(9,A1:A4)", &AllRowsVisible),
            CellValue::Number(23.0)
        );
    }

    #[test]
    fn test_subtotal_ignores_nested_subtotals() {
        let mut sheet = merged_sheet();
        sheet.set_cell_value("A5", CellValue::formula("=SUBTOTAL(9,A1:A4)")).unwrap();
        assert_eq!(
            eval(&sheet, "=SUBTOTAL(9,A1:A5)", &AllRowsVisible),
            CellValue::Number(23.0)
        );
        assert_eq!(
            eval(&sheet, "=SUM(A1:A5)", &AllRowsVisible),
            CellValue::Number(46.0)
        );
    }

    #[test]
    fn test_scaled_product() {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("F4", "100,000").unwrap();
        sheet.set_cell_value("G4", 35).unwrap();
        sheet.set_cell_value("H4", CellValue::formula("=F4*(G4/100)")).unwrap();
        sheet.set_cell_value("H5", CellValue::formula("=H4")).unwrap();

        assert_eq!(
            eval(&sheet, "=F4*(G4/100)", &AllRowsVisible),
            CellValue::Number(35000.0)
        );
        assert_eq!(
            eval(&sheet, "=H5", &AllRowsVisible),
            CellValue::Number(35000.0)
        );
        assert_eq!(
            eval(&sheet, "=SUM(H4:H4)", &AllRowsVisible),
            CellValue::Number(35000.0)
        );
        assert_eq!(
            eval(&sheet, "=F9*(G4/100)", &AllRowsVisible),
            CellValue::Number(0.0)
        );
    }

    #[test]
    fn test_reference_returns_raw_content() {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("B2", "SUV").unwrap();
        assert_eq!(eval(&sheet, "=B2", &AllRowsVisible), CellValue::text("SUV"));
    }

    #[test]
    fn test_unsupported_falls_back_to_text() {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("A1", "n/a").unwrap();
        sheet.set_cell_value("B1", 3).unwrap();

        assert_eq!(
            eval(&sheet, "=VLOOKUP(A1,B:C,2)", &AllRowsVisible),
            CellValue::text("=VLOOKUP(A1,B:C,2)")
        );
        assert_eq!(
            eval(&sheet, "=A1*(B1/100)", &AllRowsVisible),
            CellValue::text("=A1*(B1/100)")
        );
        assert_eq!(
            eval(&sheet, "=B1*(B1/0)", &AllRowsVisible),
            CellValue::text("=B1*(B1/0)")
        );
    }

    #[test]
    fn test_self_reference_does_not_overflow() {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("A1", CellValue::formula("=A1")).unwrap();
        let source = WorksheetSource::new(&sheet);
        let evaluator = FormulaEvaluator::new(&source, &AllRowsVisible);

        assert_eq!(
            evaluator.evaluate_cell(1, 1),
            Err(FormulaError::NestingTooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn test_range_beyond_sheet_is_clipped() {
        let sheet = merged_sheet();
        assert_eq!(
            eval(&sheet, "=SUM(A1:A1048576)", &AllRowsVisible),
            CellValue::Number(23.0)
        );
        assert_eq!(
            eval(&sheet, "=SUM(C10:D20)", &AllRowsVisible),
            CellValue::Number(0.0)
        );
    }

    #[test]
    fn test_non_formula_unchanged() {
        let sheet = merged_sheet();
        let source = WorksheetSource::new(&sheet);
        let evaluator = FormulaEvaluator::new(&source, &AllRowsVisible);
        assert_eq!(
            evaluator.evaluate(&CellValue::text("plain")),
            Ok(CellValue::text("plain"))
        );
    }
}
