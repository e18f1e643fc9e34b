//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while evaluating a formula for display.
///
/// None of these reach the user: the display path falls back to the literal
/// formula text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// The formula is outside the supported grammar
    #[error("Unsupported formula: {0}")]
    Unsupported(String),

    /// Reference that does not name a cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// An operand of an arithmetic formula is not a number
    #[error("Cell {address} is not numeric: {value}")]
    NotNumeric { address: String, value: String },

    /// Division by zero in an arithmetic formula
    #[error("Division by zero")]
    DivisionByZero,

    /// References nest deeper than the evaluator follows
    #[error("Formula references nest deeper than {0} levels")]
    NestingTooDeep(usize),
}
