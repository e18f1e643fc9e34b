//! Worksheet type

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::merge::MergeIndex;
use crate::style::{FillStyle, Style, StylePool};
use crate::{MAX_COLS, MAX_ROWS};

static EMPTY: CellValue = CellValue::Empty;

/// Sheet visibility as stored in the workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    /// Shown as a tab
    #[default]
    Visible,
    /// Hidden, but the user can unhide it
    Hidden,
    /// Hidden and only reachable programmatically
    VeryHidden,
}

impl SheetState {
    /// The `state` attribute value used in workbook XML
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    /// Parse a `state` attribute; unknown values are treated as visible
    pub fn parse(s: &str) -> Self {
        match s {
            "hidden" => SheetState::Hidden,
            "veryHidden" => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

/// A single worksheet: sparse cells, merged regions, hidden rows and the
/// styles its cells refer to. Coordinates are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
    styles: StylePool,
    merged_regions: Vec<CellRange>,
    state: SheetState,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            styles: StylePool::new(),
            merged_regions: Vec::new(),
            state: SheetState::Visible,
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the visibility state
    pub fn state(&self) -> SheetState {
        self.state
    }

    /// Set the visibility state
    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    // === Cell access ===

    /// Get cell data at a position
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Raw value stored at a position (no merge resolution)
    pub fn value_at(&self, row: u32, col: u16) -> &CellValue {
        self.cells.get(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Raw value stored at an A1 address
    pub fn value(&self, address: &str) -> Result<&CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.value_at(addr.row, addr.col))
    }

    /// Set a cell value at a position, preserving its style
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        check_bounds(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell value at an A1 address
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Write through merges: a secondary merged cell redirects to its anchor.
    /// Returns the coordinates actually written.
    pub fn set_merged_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<(u32, u16)> {
        let (ar, ac) = self.merge_anchor(row, col);
        self.set_cell_value_at(ar, ac, value)?;
        Ok((ar, ac))
    }

    /// Iterate over every stored cell in row order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Iterate over stored rows
    pub fn iter_rows(&self) -> impl Iterator<Item = (u32, &std::collections::BTreeMap<u16, CellData>)> {
        self.cells.iter_rows()
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Last row that holds a cell or is covered by a merged region, 0 if none
    pub fn max_row(&self) -> u32 {
        self.merged_regions
            .iter()
            .map(|r| r.end.row)
            .fold(self.cells.max_row(), u32::max)
    }

    /// Last column that holds a cell or is covered by a merged region, 0 if none
    pub fn max_col(&self) -> u16 {
        self.merged_regions
            .iter()
            .map(|r| r.end.col)
            .fold(self.cells.max_col(), u16::max)
    }

    // === Styles ===

    /// The style pool cells on this sheet index into
    pub fn styles(&self) -> &StylePool {
        &self.styles
    }

    /// Style index of a cell (0 = default)
    pub fn style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map(|c| c.style_index).unwrap_or(0)
    }

    /// Resolved style of a cell
    pub fn style_at(&self, row: u32, col: u16) -> Style {
        self.styles
            .get(self.style_index_at(row, col))
            .cloned()
            .unwrap_or_default()
    }

    /// Set the style of a cell, preserving its value
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        check_bounds(row, col)?;
        let index = self.styles.get_or_insert(style.clone());
        self.cells.set_style(row, col, index);
        Ok(())
    }

    /// Replace only the fill of a cell, keeping its number format
    pub fn set_fill_at(&mut self, row: u32, col: u16, fill: FillStyle) -> Result<()> {
        let mut style = self.style_at(row, col);
        style.fill = fill;
        self.set_cell_style_at(row, col, &style)
    }

    /// Store a cell exactly as read from a file
    pub fn insert_cell(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        check_bounds(row, col)?;
        self.cells.set(row, col, data);
        Ok(())
    }

    /// Register a style read from a file; returns its pool index
    pub fn intern_style(&mut self, style: Style) -> u32 {
        self.styles.get_or_insert(style)
    }

    // === Rows ===

    /// Whether a row is manually hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    /// Hide or show a row
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    /// Manually hidden rows in ascending order
    pub fn hidden_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.hidden_rows()
    }

    // === Merged cells ===

    /// Get all merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Merge a range. Fails if it overlaps an existing merged region.
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        check_bounds(range.end.row, range.end.col)?;
        check_bounds(range.start.row, range.start.col)?;
        if let Some(existing) = self.merged_regions.iter().find(|r| r.overlaps(range)) {
            return Err(Error::MergedCellConflict(format!("{} (with {})", range, existing)));
        }
        self.merged_regions.push(*range);
        Ok(())
    }

    /// Merge a range given in A1 notation
    pub fn merge(&mut self, range: &str) -> Result<()> {
        self.merge_cells(&CellRange::parse(range)?)
    }

    /// Remove an exact merged region. Returns `true` if it existed.
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let before = self.merged_regions.len();
        self.merged_regions.retain(|r| r != range);
        self.merged_regions.len() != before
    }

    /// Anchor of the merged region containing a cell, or the cell itself.
    ///
    /// Scans the region list; build a [`MergeIndex`] for repeated lookups.
    pub fn merge_anchor(&self, row: u32, col: u16) -> (u32, u16) {
        self.merged_regions
            .iter()
            .find(|r| r.contains(row, col))
            .map(|r| (r.start.row, r.start.col))
            .unwrap_or((row, col))
    }

    /// Build a lookup index over the current merged regions
    pub fn merge_index(&self) -> MergeIndex {
        MergeIndex::new(&self.merged_regions)
    }
}

fn check_bounds(row: u32, col: u16) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS));
    }
    if col == 0 || col > MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
    }
    Ok(())
}
