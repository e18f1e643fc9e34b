//! Style pool for deduplication

use super::Style;
use ahash::AHashMap;

/// Deduplicating style table; cells refer to styles by index.
///
/// Index 0 is always the default style.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    index_map: AHashMap<Style, u32>,
}

impl StylePool {
    /// Create a new style pool with the default style at index 0
    pub fn new() -> Self {
        let mut pool = Self {
            styles: Vec::with_capacity(16),
            index_map: AHashMap::with_capacity(16),
        };
        pool.get_or_insert(Style::default());
        pool
    }

    /// Get or create a style, returning its index
    pub fn get_or_insert(&mut self, style: Style) -> u32 {
        if let Some(&idx) = self.index_map.get(&style) {
            return idx;
        }

        let idx = self.styles.len() as u32;
        self.index_map.insert(style.clone(), idx);
        self.styles.push(style);
        idx
    }

    /// Get a style by index
    pub fn get(&self, index: u32) -> Option<&Style> {
        self.styles.get(index as usize)
    }

    /// Number of styles, default included
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style exists
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    /// Iterate over all styles with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl PartialEq for StylePool {
    fn eq(&self, other: &Self) -> bool {
        self.styles == other.styles
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, NumberFormat};

    #[test]
    fn test_default_style() {
        let pool = StylePool::new();
        assert_eq!(pool.len(), 1);
        assert!(pool.is_empty());
        assert_eq!(pool.get(0), Some(&Style::default()));
    }

    #[test]
    fn test_deduplication() {
        let mut pool = StylePool::new();

        let highlight = pool.get_or_insert(Style::new().fill_color(Color::YELLOW));
        let again = pool.get_or_insert(Style::new().fill_color(Color::YELLOW));
        let dated = pool.get_or_insert(
            Style::new()
                .fill_color(Color::YELLOW)
                .with_number_format(NumberFormat::BuiltIn(14)),
        );

        assert_eq!(highlight, again);
        assert_ne!(highlight, dated);
        assert_eq!(pool.len(), 3);
    }
}
