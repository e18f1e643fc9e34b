//! Cell styling
//!
//! Only the parts of a style that the claims workflow reads or writes are
//! modelled: the background fill (used to highlight offending cells) and
//! the number format (used to recognize and write dates).

mod color;
mod number_format;
mod pool;

pub use color::Color;
pub use number_format::NumberFormat;
pub use pool::StylePool;

/// Cell background fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillStyle {
    /// No fill (transparent)
    #[default]
    None,

    /// Solid color fill
    Solid { color: Color },
}

impl FillStyle {
    /// Create a solid fill with the given color
    pub fn solid(color: Color) -> Self {
        FillStyle::Solid { color }
    }

    /// Check if this is a "no fill"
    pub fn is_none(&self) -> bool {
        matches!(self, FillStyle::None)
    }
}

/// Complete cell style, deduplicated through [`StylePool`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Fill/background settings
    pub fill: FillStyle,
    /// Number format
    pub number_format: NumberFormat,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fill color (solid fill)
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::Solid { color };
        self
    }

    /// Set the number format
    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    /// The solid fill color, if any
    pub fn fill_rgb(&self) -> Option<Color> {
        match self.fill {
            FillStyle::Solid { color } => Some(color),
            FillStyle::None => None,
        }
    }
}
