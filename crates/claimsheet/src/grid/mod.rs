//! Editable grid over one worksheet
//!
//! [`GridModel`] keeps user edits in an overlay keyed by merge anchor and
//! leaves the worksheet alone until [`GridModel::apply_dirty_to_sheet`]. The
//! model does not own the sheet; every read takes it as a parameter, which
//! lets the session flush, save or swap sheets without fighting borrows.

mod history;

pub use history::{EditRecord, History, HISTORY_CAPACITY};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use claimsheet_core::{CellRange, CellValue, MergeIndex, Result, Worksheet, MAX_COLS, MAX_ROWS};
use claimsheet_formula::CellSource;

use crate::columns::{header_matches, normalize_header, MatchMode};

/// Why an edit was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidEdit {
    HeaderRow,
    SecondaryMergedCell,
    LockedColumn,
    OutOfBounds,
}

impl fmt::Display for InvalidEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvalidEdit::HeaderRow => "the header row is read-only",
            InvalidEdit::SecondaryMergedCell => "only the top-left cell of a merged region is editable",
            InvalidEdit::LockedColumn => "column is not editable",
            InvalidEdit::OutOfBounds => "cell is outside the sheet",
        })
    }
}

/// Columns open for editing when edit-all is off
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableColumns(BTreeSet<u16>);

impl EditableColumns {
    /// Columns whose header contains every term of at least one group
    pub fn discover(sheet: &Worksheet, header_row: u32, groups: &[Vec<String>]) -> Self {
        let cols = (1..=sheet.max_col())
            .filter(|&col| {
                let header = normalize_header(&sheet.value_at(header_row, col).to_string());
                !header.is_empty()
                    && groups
                        .iter()
                        .any(|group| !group.is_empty() && header_matches(&header, group, MatchMode::All))
            })
            .collect();
        Self(cols)
    }

    pub fn contains(&self, col: u16) -> bool {
        self.0.contains(&col)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u16> for EditableColumns {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

type Observer = Box<dyn FnMut(CellRange)>;

/// Overlay, edit policy and history for one worksheet
pub struct GridModel {
    header_row: u32,
    merges: MergeIndex,
    editable: EditableColumns,
    edit_all: bool,
    overlay: BTreeMap<(u32, u16), CellValue>,
    history: History,
    replaying: bool,
    observers: Vec<Observer>,
}

impl fmt::Debug for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridModel")
            .field("header_row", &self.header_row)
            .field("editable", &self.editable)
            .field("edit_all", &self.edit_all)
            .field("overlay", &self.overlay)
            .field("history", &self.history)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl GridModel {
    /// Index the sheet's merges. Rebuild the model whenever they change.
    pub fn new(sheet: &Worksheet, header_row: u32, editable: EditableColumns) -> Self {
        Self {
            header_row,
            merges: sheet.merge_index(),
            editable,
            edit_all: false,
            overlay: BTreeMap::new(),
            history: History::new(),
            replaying: false,
            observers: Vec::new(),
        }
    }

    pub fn header_row(&self) -> u32 {
        self.header_row
    }

    pub fn merges(&self) -> &MergeIndex {
        &self.merges
    }

    pub fn editable_columns(&self) -> &EditableColumns {
        &self.editable
    }

    pub fn edit_all(&self) -> bool {
        self.edit_all
    }

    /// Lift the column restriction. Header and merged cells stay locked.
    pub fn set_edit_all(&mut self, edit_all: bool) {
        self.edit_all = edit_all;
    }

    /// Merge anchor of a position
    pub fn canonical(&self, row: u32, col: u16) -> (u32, u16) {
        self.merges.canonical(row, col)
    }

    /// Effective value: the overlay entry of the anchor, else the sheet's
    pub fn get(&self, sheet: &Worksheet, row: u32, col: u16) -> CellValue {
        let key = self.canonical(row, col);
        match self.overlay.get(&key) {
            Some(value) => value.clone(),
            None => sheet.value_at(key.0, key.1).clone(),
        }
    }

    /// Whether the cell (or its merge anchor) carries an uncommitted edit
    pub fn is_dirty(&self, row: u32, col: u16) -> bool {
        self.overlay.contains_key(&self.canonical(row, col))
    }

    pub fn overlay(&self) -> &BTreeMap<(u32, u16), CellValue> {
        &self.overlay
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Check the edit policy for a position
    pub fn check_editable(&self, row: u32, col: u16) -> std::result::Result<(), InvalidEdit> {
        if row == 0 || col == 0 || row > MAX_ROWS || col > MAX_COLS {
            return Err(InvalidEdit::OutOfBounds);
        }
        if row == self.header_row {
            return Err(InvalidEdit::HeaderRow);
        }
        if self.merges.is_secondary(row, col) {
            return Err(InvalidEdit::SecondaryMergedCell);
        }
        if !self.edit_all && !self.editable.contains(col) {
            return Err(InvalidEdit::LockedColumn);
        }
        Ok(())
    }

    /// Edit a cell. Returns false when the policy refuses it.
    ///
    /// Writing the value a cell already shows is accepted but records
    /// nothing.
    pub fn set(&mut self, sheet: &Worksheet, row: u32, col: u16, value: CellValue) -> bool {
        if let Err(reason) = self.check_editable(row, col) {
            log::debug!("edit at ({}, {}) refused: {}", row, col, reason);
            return false;
        }

        let (ar, ac) = self.canonical(row, col);
        if self.get(sheet, ar, ac) == value {
            return true;
        }

        self.write(ar, ac, Some(value));
        true
    }

    /// Revert the newest edit. Returns the region to repaint.
    pub fn undo(&mut self) -> Option<CellRange> {
        let record = self.history.undo()?;
        Some(self.replay(record.row, record.col, record.old))
    }

    /// Reapply the newest undone edit. Returns the region to repaint.
    pub fn redo(&mut self) -> Option<CellRange> {
        let record = self.history.redo()?;
        Some(self.replay(record.row, record.col, Some(record.new)))
    }

    fn replay(&mut self, row: u32, col: u16, value: Option<CellValue>) -> CellRange {
        self.replaying = true;
        let extent = self.write(row, col, value);
        self.replaying = false;
        extent
    }

    /// Put (or with `None`, drop) an overlay entry at an anchor. History is
    /// recorded only outside replay.
    fn write(&mut self, row: u32, col: u16, value: Option<CellValue>) -> CellRange {
        let old = match &value {
            Some(value) => self.overlay.insert((row, col), value.clone()),
            None => self.overlay.remove(&(row, col)),
        };
        if let (false, Some(new)) = (self.replaying, value) {
            self.history.record(EditRecord { row, col, old, new });
        }
        self.notify(row, col)
    }

    /// Copy every overlay entry into the sheet. The overlay is kept so
    /// edited cells still show as dirty.
    pub fn apply_dirty_to_sheet(&self, sheet: &mut Worksheet) -> Result<()> {
        for (&(row, col), value) in &self.overlay {
            sheet.set_cell_value_at(row, col, value.clone())?;
        }
        if !self.overlay.is_empty() {
            log::debug!("flushed {} edit(s) into '{}'", self.overlay.len(), sheet.name());
        }
        Ok(())
    }

    /// Register a callback fired with the affected region after each change
    pub fn subscribe<F: FnMut(CellRange) + 'static>(&mut self, observer: F) {
        self.observers.push(Box::new(observer));
    }

    /// Hand the observers to a rebuilt model
    pub(crate) fn take_observers(&mut self) -> Vec<Observer> {
        std::mem::take(&mut self.observers)
    }

    pub(crate) fn restore_observers(&mut self, observers: Vec<Observer>) {
        self.observers = observers;
    }

    fn notify(&mut self, row: u32, col: u16) -> CellRange {
        let extent = self.merges.extent(row, col);
        for observer in &mut self.observers {
            observer(extent);
        }
        extent
    }
}

/// A worksheet seen through a model's overlay, for formula evaluation
pub struct GridView<'a> {
    sheet: &'a Worksheet,
    model: &'a GridModel,
}

impl<'a> GridView<'a> {
    pub fn new(sheet: &'a Worksheet, model: &'a GridModel) -> Self {
        Self { sheet, model }
    }
}

impl CellSource for GridView<'_> {
    fn value(&self, row: u32, col: u16) -> CellValue {
        self.model.get(self.sheet, row, col)
    }

    fn canonical(&self, row: u32, col: u16) -> (u32, u16) {
        self.model.canonical(row, col)
    }

    fn is_row_hidden(&self, row: u32) -> bool {
        self.sheet.is_row_hidden(row)
    }

    fn extent(&self) -> Option<(u32, u16)> {
        let (rows, cols) = self
            .model
            .overlay
            .keys()
            .fold((self.sheet.max_row(), self.sheet.max_col()), |(r, c), &(kr, kc)| {
                (r.max(kr), c.max(kc))
            });
        Some((rows, cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimsheet_formula::{AllRowsVisible, FormulaEvaluator};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn claims_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Claims");
        sheet.set_cell_value("A3", "Vehicle").unwrap();
        sheet.set_cell_value("B3", "Occurrence").unwrap();
        sheet.set_cell_value("C3", "구상 율").unwrap();
        sheet.set_cell_value("D3", "Chargeback").unwrap();
        sheet.set_cell_value("A4", "SUV").unwrap();
        sheet.merge("A4:A6").unwrap();
        sheet.set_cell_value("B4", 100000).unwrap();
        sheet.set_cell_value("C4", 50).unwrap();
        sheet.set_cell_value("C5", 30).unwrap();
        sheet
    }

    fn model(sheet: &Worksheet) -> GridModel {
        let groups = vec![vec!["구상".to_string(), "율".to_string()]];
        GridModel::new(sheet, 3, EditableColumns::discover(sheet, 3, &groups))
    }

    #[test]
    fn test_discover_editable_columns() {
        let sheet = claims_sheet();
        let model = model(&sheet);
        assert_eq!(model.editable_columns().iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_merged_reads_share_anchor() {
        let sheet = claims_sheet();
        let model = model(&sheet);
        for row in 4..=6 {
            assert_eq!(model.get(&sheet, row, 1), CellValue::text("SUV"));
        }
    }

    #[test]
    fn test_rejected_edits() {
        let sheet = claims_sheet();
        let mut model = model(&sheet);

        assert_eq!(model.check_editable(3, 3), Err(InvalidEdit::HeaderRow));
        assert_eq!(model.check_editable(5, 1), Err(InvalidEdit::SecondaryMergedCell));
        assert_eq!(model.check_editable(4, 2), Err(InvalidEdit::LockedColumn));
        assert_eq!(model.check_editable(0, 2), Err(InvalidEdit::OutOfBounds));

        assert!(!model.set(&sheet, 3, 3, CellValue::Number(1.0)));
        assert!(!model.set(&sheet, 6, 1, CellValue::text("Sedan")));
        assert!(!model.set(&sheet, 4, 2, CellValue::Number(1.0)));
        assert!(model.overlay().is_empty());

        // Edit-all opens columns, never the header or merged secondaries
        model.set_edit_all(true);
        assert!(model.set(&sheet, 4, 2, CellValue::Number(1.0)));
        assert!(model.set(&sheet, 4, 1, CellValue::text("Sedan")));
        assert!(!model.set(&sheet, 5, 1, CellValue::text("Truck")));
        assert!(!model.set(&sheet, 3, 2, CellValue::text("Amount")));
        assert_eq!(model.overlay().len(), 2);
        assert_eq!(model.get(&sheet, 6, 1), CellValue::text("Sedan"));
    }

    #[test]
    fn test_unchanged_value_records_nothing() {
        let sheet = claims_sheet();
        let mut model = model(&sheet);
        assert!(model.set(&sheet, 4, 3, CellValue::Number(50.0)));
        assert!(model.overlay().is_empty());
        assert!(!model.history().can_undo());
    }

    #[test]
    fn test_undo_redo() {
        let sheet = claims_sheet();
        let mut model = model(&sheet);

        model.set(&sheet, 4, 3, CellValue::Number(0.0));
        model.set(&sheet, 4, 3, CellValue::Number(10.0));
        assert!(model.is_dirty(4, 3));

        model.undo();
        assert_eq!(model.get(&sheet, 4, 3), CellValue::Number(0.0));
        model.undo();
        assert_eq!(model.get(&sheet, 4, 3), CellValue::Number(50.0));
        assert!(!model.is_dirty(4, 3));
        assert_eq!(model.undo(), None);

        model.redo();
        model.redo();
        assert_eq!(model.get(&sheet, 4, 3), CellValue::Number(10.0));
        assert_eq!(model.history().undo_len(), 2);
        assert!(!model.history().can_redo());
    }

    #[test]
    fn test_observers_get_merged_extent() {
        let sheet = claims_sheet();
        let mut model = model(&sheet);
        model.set_edit_all(true);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        model.subscribe(move |range| sink.borrow_mut().push(range.to_a1_string()));

        model.set(&sheet, 4, 1, CellValue::text("Sedan"));
        model.undo();
        model.set(&sheet, 5, 3, CellValue::Number(0.0));

        assert_eq!(*seen.borrow(), vec!["A4:A6", "A4:A6", "C5"]);
    }

    #[test]
    fn test_apply_dirty_keeps_overlay() {
        let mut sheet = claims_sheet();
        let mut model = model(&sheet);
        model.set(&sheet, 5, 3, CellValue::Number(0.0));
        model.apply_dirty_to_sheet(&mut sheet).unwrap();

        assert_eq!(sheet.value_at(5, 3), &CellValue::Number(0.0));
        assert!(model.is_dirty(5, 3));
    }

    #[test]
    fn test_view_evaluates_overlay() {
        let mut sheet = claims_sheet();
        sheet.set_cell_value("D4", CellValue::formula("=B4*(C4/100)")).unwrap();
        let mut model = model(&sheet);
        model.set(&sheet, 4, 3, CellValue::Number(20.0));

        let view = GridView::new(&sheet, &model);
        let evaluator = FormulaEvaluator::new(&view, &AllRowsVisible);
        assert_eq!(evaluator.evaluate_cell(4, 4).unwrap(), CellValue::Number(20000.0));
    }
}
