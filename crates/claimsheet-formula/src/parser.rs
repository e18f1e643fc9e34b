//! Formula parser
//!
//! Recognizes the four formula shapes of [`DisplayFormula`]. Whitespace is
//! insignificant, function names and column letters are case-insensitive,
//! and `$` markers are accepted. Anything else is [`FormulaError::Unsupported`].

use crate::ast::{DisplayFormula, SubtotalFunction};
use crate::error::{FormulaError, FormulaResult};
use claimsheet_core::{CellAddress, CellRange};
use lazy_regex::regex_captures;

/// Parse a formula (with or without the leading `=`)
///
/// # Example
/// ```rust
/// use claimsheet_formula::{parse_formula, DisplayFormula};
/// use claimsheet_core::CellAddress;
///
/// let parsed = parse_formula("=F4*(G4/100)").unwrap();
/// assert_eq!(
///     parsed,
///     DisplayFormula::ScaledProduct {
///         amount: CellAddress::new(4, 6),
///         rate: CellAddress::new(4, 7),
///         divisor: 100.0,
///     }
/// );
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<DisplayFormula> {
    let trimmed = formula.trim();
    let body: String = trimmed
        .strip_prefix('=')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if let Some((_, start, end)) = regex_captures!(
        r"^SUM\((\$?[A-Z]{1,3}\$?[0-9]+)(?::(\$?[A-Z]{1,3}\$?[0-9]+))?\)$"i,
        &body
    ) {
        return Ok(DisplayFormula::Sum(range(start, end)?));
    }

    if let Some((_, code, start, end)) = regex_captures!(
        r"^SUBTOTAL\(([0-9]+),(\$?[A-Z]{1,3}\$?[0-9]+)(?::(\$?[A-Z]{1,3}\$?[0-9]+))?\)$"i,
        &body
    ) {
        let function = code
            .parse()
            .ok()
            .and_then(SubtotalFunction::from_code)
            .ok_or_else(|| FormulaError::Unsupported(format!("SUBTOTAL function {}", code)))?;
        return Ok(DisplayFormula::Subtotal {
            function,
            range: range(start, end)?,
        });
    }

    if let Some((_, reference)) = regex_captures!(r"^(\$?[A-Z]{1,3}\$?[0-9]+)$"i, &body) {
        return Ok(DisplayFormula::Reference(address(reference)?));
    }

    if let Some((_, amount, rate, divisor)) = regex_captures!(
        r"^(\$?[A-Z]{1,3}\$?[0-9]+)\*\((\$?[A-Z]{1,3}\$?[0-9]+)/([0-9]+(?:\.[0-9]+)?)\)$"i,
        &body
    ) {
        let divisor = divisor
            .parse()
            .map_err(|_| FormulaError::Unsupported(trimmed.to_string()))?;
        return Ok(DisplayFormula::ScaledProduct {
            amount: address(amount)?,
            rate: address(rate)?,
            divisor,
        });
    }

    Err(FormulaError::Unsupported(trimmed.to_string()))
}

fn address(text: &str) -> FormulaResult<CellAddress> {
    CellAddress::parse(text).map_err(|e| FormulaError::InvalidReference(e.to_string()))
}

fn range(start: &str, end: &str) -> FormulaResult<CellRange> {
    let start = address(start)?;
    if end.is_empty() {
        return Ok(CellRange::single(start));
    }
    Ok(CellRange::new(start, address(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sum() {
        assert_eq!(
            parse_formula("=SUM(F4:F20)").unwrap(),
            DisplayFormula::Sum(CellRange::parse("F4:F20").unwrap())
        );
        assert_eq!(
            parse_formula("= sum( $f$4 : f20 )").unwrap(),
            DisplayFormula::Sum(CellRange::parse("F4:F20").unwrap())
        );
        assert_eq!(
            parse_formula("=SUM(B2)").unwrap(),
            DisplayFormula::Sum(CellRange::parse("B2").unwrap())
        );
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(
            parse_formula("=SUBTOTAL(109,H4:H40)").unwrap(),
            DisplayFormula::Subtotal {
                function: SubtotalFunction::SumVisible,
                range: CellRange::parse("H4:H40").unwrap(),
            }
        );
        assert_eq!(
            parse_formula("=subtotal(9, A1:A3)").unwrap(),
            DisplayFormula::Subtotal {
                function: SubtotalFunction::Sum,
                range: CellRange::parse("A1:A3").unwrap(),
            }
        );
        assert!(matches!(
            parse_formula("=SUBTOTAL(1,A1:A3)"),
            Err(FormulaError::Unsupported(_))
        ));
    }

    #[test]
    fn test_reference_and_product() {
        assert_eq!(
            parse_formula("=$B$7").unwrap(),
            DisplayFormula::Reference(CellAddress::new(7, 2))
        );
        assert_eq!(
            parse_formula("=F4 * (G4 / 12.5)").unwrap(),
            DisplayFormula::ScaledProduct {
                amount: CellAddress::new(4, 6),
                rate: CellAddress::new(4, 7),
                divisor: 12.5,
            }
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        for formula in [
            "=A1+B1",
            "=F4*G4/100",
            "=AVERAGE(A1:A3)",
            "=Sheet2!A1",
            "=SUM(A1:A3)*2",
            "=",
        ] {
            assert!(
                matches!(parse_formula(formula), Err(FormulaError::Unsupported(_))),
                "{} should be unsupported",
                formula
            );
        }
    }

    #[test]
    fn test_out_of_range_reference() {
        assert!(matches!(
            parse_formula("=A0"),
            Err(FormulaError::InvalidReference(_))
        ));
    }
}
