//! The formula shapes the display evaluator understands

use claimsheet_core::{CellAddress, CellRange};

/// A parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayFormula {
    /// `=SUM(A1:B5)`
    Sum(CellRange),

    /// `=SUBTOTAL(9, A1:B5)` or `=SUBTOTAL(109, A1:B5)`
    Subtotal {
        function: SubtotalFunction,
        range: CellRange,
    },

    /// `=B7`
    Reference(CellAddress),

    /// `=F4*(G4/100)`: amount times rate over a constant divisor
    ScaledProduct {
        amount: CellAddress,
        rate: CellAddress,
        divisor: f64,
    },
}

/// SUBTOTAL function codes that sum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtotalFunction {
    /// Code 9: skips filtered-out rows
    Sum,
    /// Code 109: also skips manually hidden rows
    SumVisible,
}

impl SubtotalFunction {
    /// Map a SUBTOTAL function code
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            9 => Some(SubtotalFunction::Sum),
            109 => Some(SubtotalFunction::SumVisible),
            _ => None,
        }
    }

    /// The numeric code written in formulas
    pub fn code(&self) -> u32 {
        match self {
            SubtotalFunction::Sum => 9,
            SubtotalFunction::SumVisible => 109,
        }
    }
}
