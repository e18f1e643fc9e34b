//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] / [`CellRange`] - The A1 address codec
//! - [`CellData`] / [`CellStorage`] - Sparse cell storage
//! - Excel serial date conversion

mod address;
pub mod date;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use storage::{CellData, CellStorage};
pub use value::{parse_lenient_number, CellValue, SharedString};
