//! Cell text for display and from user input

use chrono::Timelike;
use claimsheet_core::CellValue;

/// Render an evaluated value the way the claims grid shows it.
///
/// Numbers get thousands separators and at most two decimals with trailing
/// zeros dropped (`1234.5` shows as `1,234.5`, `50.0` as `50`).
pub fn format_display(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Date(dt) => {
            if dt.time().num_seconds_from_midnight() == 0 {
                dt.format("%Y-%m-%d").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
        CellValue::Text(s) => s.to_string(),
        CellValue::Formula(text) => text.clone(),
    }
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }

    let fixed = format!("{:.2}", n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if n < 0.0 && (whole != "0" || !frac.is_empty()) {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Turn text typed into a cell into a value.
///
/// Blank input clears the cell and a leading `=` makes a formula. Anything
/// that reads as a number once commas are removed becomes one; the rest is
/// kept as trimmed text.
pub fn parse_user_input(raw: &str) -> CellValue {
    let text = raw.trim();
    if text.is_empty() {
        return CellValue::Empty;
    }
    if text.starts_with('=') {
        return CellValue::formula(text);
    }

    let digits: String = text.chars().filter(|c| *c != ',').collect();
    let number = if digits.contains('.') {
        digits.parse::<f64>().ok()
    } else {
        digits.parse::<i64>().ok().map(|n| n as f64)
    };

    match number {
        Some(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_numbers() {
        let cases = [
            (0.0, "0"),
            (50.0, "50"),
            (1234567.0, "1,234,567"),
            (1234.5, "1,234.5"),
            (1234.567, "1,234.57"),
            (999.999, "1,000"),
            (-1500.25, "-1,500.25"),
            (-0.001, "0"),
            (100.0, "100"),
            (123456.0, "123,456"),
        ];
        for (n, expected) in cases {
            assert_eq!(format_display(&CellValue::Number(n)), expected, "{}", n);
        }
    }

    #[test]
    fn test_format_other_values() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(format_display(&CellValue::from(day)), "2024-06-01");
        assert_eq!(
            format_display(&CellValue::from(day.and_hms_opt(13, 5, 0).unwrap())),
            "2024-06-01 13:05:00"
        );
        assert_eq!(format_display(&CellValue::Boolean(true)), "TRUE");
        assert_eq!(format_display(&CellValue::Empty), "");
        assert_eq!(format_display(&CellValue::text("SUV")), "SUV");
        assert_eq!(format_display(&CellValue::formula("=VLOOKUP(A1)")), "=VLOOKUP(A1)");
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!(parse_user_input("  "), CellValue::Empty);
        assert_eq!(parse_user_input("1,000"), CellValue::Number(1000.0));
        assert_eq!(parse_user_input(" 12.50 "), CellValue::Number(12.5));
        assert_eq!(parse_user_input("=A1"), CellValue::Formula("=A1".into()));
        assert_eq!(parse_user_input(" SUV "), CellValue::text("SUV"));
        assert_eq!(parse_user_input("1.2.3"), CellValue::text("1.2.3"));
        assert_eq!(parse_user_input("inf"), CellValue::text("inf"));
    }
}
