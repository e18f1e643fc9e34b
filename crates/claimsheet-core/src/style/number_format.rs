//! Number format types

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;

    /// ISO date, written for dates whose cell has no date format
    pub fn iso_date() -> Self {
        NumberFormat::Custom("yyyy-mm-dd".into())
    }

    /// Create a number format from its id and, for custom ids, its code
    pub fn from_id(id: u32, custom_code: Option<&str>) -> Self {
        match (id, custom_code) {
            (0, _) => NumberFormat::General,
            (_, Some(code)) => NumberFormat::Custom(code.to_string()),
            (id, None) => NumberFormat::BuiltIn(id),
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(code) => is_date_code(code),
        }
    }
}

/// Date codes carry `y`, `d` or `h` outside quoted literals and `[...]`
/// sections (colors, locales, elapsed time).
fn is_date_code(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if in_quotes || in_brackets => {}
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' => return true,
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formats() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::iso_date().is_date_format());
        assert!(NumberFormat::Custom("yyyy\"년\" m\"월\"".into()).is_date_format());
        assert!(!NumberFormat::BuiltIn(3).is_date_format());
        assert!(!NumberFormat::Custom("#,##0\"d\"".into()).is_date_format());
        assert!(!NumberFormat::Custom("[Red]#,##0".into()).is_date_format());
        assert!(!NumberFormat::General.is_date_format());
    }

    #[test]
    fn test_from_id() {
        assert_eq!(NumberFormat::from_id(0, None), NumberFormat::General);
        assert_eq!(NumberFormat::from_id(14, None), NumberFormat::BuiltIn(14));
        assert_eq!(
            NumberFormat::from_id(164, Some("yyyy-mm-dd")),
            NumberFormat::iso_date()
        );
    }
}
