//! # claimsheet-formula
//!
//! Display-time formula evaluation for claim sheets.
//!
//! Only four formula shapes are understood:
//! - `=SUM(range)`
//! - `=SUBTOTAL(9, range)` / `=SUBTOTAL(109, range)`, filter-aware
//! - `=A1`, a bare cell reference
//! - `=A1*(B1/100)`, an amount scaled by a rate
//!
//! Everything else is shown as its literal text. Ranges are merge-aware:
//! a merged region contributes its anchor value once.
//!
//! ## Example
//!
//! ```rust
//! use claimsheet_core::{CellValue, Worksheet};
//! use claimsheet_formula::{AllRowsVisible, FormulaEvaluator, WorksheetSource};
//!
//! let mut sheet = Worksheet::new("Claims");
//! sheet.set_cell_value("A1", 100000).unwrap();
//! sheet.set_cell_value("B1", 50).unwrap();
//!
//! let source = WorksheetSource::new(&sheet);
//! let evaluator = FormulaEvaluator::new(&source, &AllRowsVisible);
//! let value = evaluator.display(&CellValue::formula("=A1*(B1/100)"));
//! assert_eq!(value, CellValue::Number(50000.0));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{DisplayFormula, SubtotalFunction};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    AllRowsVisible, CellSource, FormulaEvaluator, RowVisibility, WorksheetSource, MAX_DEPTH,
};
pub use parser::parse_formula;
