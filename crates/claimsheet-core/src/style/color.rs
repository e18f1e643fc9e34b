//! Color representation

use std::fmt;

/// Color as stored in a spreadsheet file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// ARGB color
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Theme color index; tint is kept in hundredths so styles stay hashable
    Theme { index: u8, tint: i8 },

    /// Legacy palette index
    Indexed(u8),
}

impl Color {
    /// Highlight used for cells changed by preprocessing
    pub const YELLOW: Color = Color::rgb(0xFF, 0xFF, 0x00);

    /// Create an opaque RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a: 0xFF, r, g, b }
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with an optional `#`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// `AARRGGBB` for ARGB colors, `None` for theme/indexed/auto
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Argb { .. } => write!(f, "#{}", self.to_argb_hex().unwrap_or_default()),
            Color::Theme { index, tint } => write!(f, "theme{}({:+})", index, tint),
            Color::Indexed(i) => write!(f, "indexed{}", i),
        }
    }
}
