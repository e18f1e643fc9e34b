//! Bounded undo/redo history

use std::collections::VecDeque;

use claimsheet_core::CellValue;

/// Number of edits kept on each stack
pub const HISTORY_CAPACITY: usize = 100;

/// One overlay change, keyed by merge anchor.
///
/// `old` is the overlay entry before the edit; `None` means the cell had no
/// overlay entry and undo removes it again.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub row: u32,
    pub col: u16,
    pub old: Option<CellValue>,
    pub new: CellValue,
}

/// Undo and redo stacks
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: VecDeque<EditRecord>,
    redo_stack: VecDeque<EditRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh edit; clears the redo stack
    pub fn record(&mut self, record: EditRecord) {
        push_bounded(&mut self.undo_stack, record);
        self.redo_stack.clear();
    }

    /// Move the newest edit to the redo stack and return it
    pub fn undo(&mut self) -> Option<EditRecord> {
        let record = self.undo_stack.pop_back()?;
        push_bounded(&mut self.redo_stack, record.clone());
        Some(record)
    }

    /// Move the newest undone edit back to the undo stack and return it
    pub fn redo(&mut self) -> Option<EditRecord> {
        let record = self.redo_stack.pop_back()?;
        push_bounded(&mut self.undo_stack, record.clone());
        Some(record)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

fn push_bounded(stack: &mut VecDeque<EditRecord>, record: EditRecord) {
    if stack.len() == HISTORY_CAPACITY {
        stack.pop_front();
    }
    stack.push_back(record);
}
