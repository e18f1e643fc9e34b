//! Merge index
//!
//! A lookup structure derived from a sheet's merged regions. Every cell of a
//! multi-cell region maps to the region's anchor (top-left cell); every
//! anchor maps to the bounds of its region. The index is a snapshot: rebuild
//! it after merging or unmerging.

use ahash::AHashMap;

use crate::cell::CellRange;

/// Cell → anchor and anchor → bounds lookups for a set of merged regions
#[derive(Debug, Clone, Default)]
pub struct MergeIndex {
    anchors: AHashMap<(u32, u16), (u32, u16)>,
    bounds: AHashMap<(u32, u16), CellRange>,
}

impl MergeIndex {
    /// Build the index from a list of non-overlapping merged regions.
    /// Single-cell ranges are ignored.
    pub fn new(regions: &[CellRange]) -> Self {
        let mut index = Self::default();

        for region in regions.iter().filter(|r| r.is_multi_cell()) {
            let anchor = (region.start.row, region.start.col);
            index.bounds.insert(anchor, *region);
            for cell in region.cells() {
                index.anchors.insert((cell.row, cell.col), anchor);
            }
        }

        index
    }

    /// The anchor of the region containing `(row, col)`, or `(row, col)`
    /// itself when the cell is not merged.
    pub fn canonical(&self, row: u32, col: u16) -> (u32, u16) {
        self.anchors.get(&(row, col)).copied().unwrap_or((row, col))
    }

    /// True for merged cells other than the anchor
    pub fn is_secondary(&self, row: u32, col: u16) -> bool {
        self.canonical(row, col) != (row, col)
    }

    /// Bounds of the region anchored at `(row, col)`, if that cell is an anchor
    pub fn bounds(&self, row: u32, col: u16) -> Option<CellRange> {
        self.bounds.get(&(row, col)).copied()
    }

    /// The full extent affected by writing `(row, col)`: its merged region,
    /// or the single cell when unmerged.
    pub fn extent(&self, row: u32, col: u16) -> CellRange {
        let (ar, ac) = self.canonical(row, col);
        self.bounds(ar, ac)
            .unwrap_or_else(|| CellRange::from_indices(ar, ac, ar, ac))
    }

    /// Number of indexed regions
    pub fn region_count(&self) -> usize {
        self.bounds.len()
    }
}
