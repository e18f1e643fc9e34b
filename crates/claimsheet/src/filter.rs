//! Row filtering by column values
//!
//! A [`RowFilter`] is the user's filter state; [`FilteredRows`] is that state
//! evaluated against a sheet and is what SUBTOTAL consults.

use std::collections::{BTreeMap, BTreeSet};

use claimsheet_formula::RowVisibility;

/// Stands in for blank cells in allowed-value sets and value lists
pub const BLANK_TOKEN: &str = "(blank)";

/// Per-column allowed values plus a free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    allowed: BTreeMap<u16, BTreeSet<String>>,
    search: Option<String>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows whose cell in `col` displays one of `values`.
    /// An empty set hides every row.
    pub fn set_column<I, S>(&mut self, col: u16, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(col, values.into_iter().map(Into::into).collect());
    }

    pub fn clear_column(&mut self, col: u16) {
        self.allowed.remove(&col);
    }

    pub fn column(&self, col: u16) -> Option<&BTreeSet<String>> {
        self.allowed.get(&col)
    }

    /// Case-insensitive text that some cell of the row must contain
    pub fn set_search<S: Into<String>>(&mut self, text: Option<S>) {
        self.search = text
            .map(Into::into)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
    }

    pub fn clear(&mut self) {
        self.allowed.clear();
        self.search = None;
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.search.is_none()
    }

    /// Does a row pass, given a lookup of its display text by column
    pub fn accepts<F>(&self, max_col: u16, text: F) -> bool
    where
        F: Fn(u16) -> String,
    {
        for (&col, allowed) in &self.allowed {
            if col == 0 || col > max_col {
                continue;
            }
            let value = text(col);
            let key = if value.is_empty() { BLANK_TOKEN } else { value.as_str() };
            if !allowed.contains(key) {
                return false;
            }
        }

        match &self.search {
            Some(needle) => (1..=max_col).any(|col| text(col).to_lowercase().contains(needle)),
            None => true,
        }
    }

    /// Evaluate the filter over `first_row..=last_row`.
    ///
    /// `text(row, col)` gives a cell's trimmed display text.
    pub fn apply<F>(&self, first_row: u32, last_row: u32, max_col: u16, text: F) -> FilteredRows
    where
        F: Fn(u32, u16) -> String,
    {
        if self.is_empty() {
            return FilteredRows::default();
        }
        let hidden = (first_row..=last_row)
            .filter(|&row| !self.accepts(max_col, |col| text(row, col)))
            .collect();
        FilteredRows { hidden }
    }
}

/// Rows the active filter hides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredRows {
    hidden: BTreeSet<u32>,
}

impl FilteredRows {
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn hidden_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.hidden.iter().copied()
    }
}

impl RowVisibility for FilteredRows {
    fn is_row_visible(&self, row: u32) -> bool {
        !self.hidden.contains(&row)
    }
}

/// Distinct display values, blank cells as [`BLANK_TOKEN`], sorted
pub fn unique_values<I: IntoIterator<Item = String>>(texts: I) -> Vec<String> {
    texts
        .into_iter()
        .map(|t| if t.is_empty() { BLANK_TOKEN.to_string() } else { t })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
