//! Common imports
//!
//! ```rust
//! use claimsheet::prelude::*;
//! ```

pub use crate::{
    preprocess,
    CellAddress,
    CellRange,
    CellValue,
    ChangedRowSet,
    ColumnLayout,
    // Errors
    Error,
    GridModel,
    PreprocessConfig,
    PreprocessError,
    PreprocessGuard,
    PreprocessReport,
    Result,
    RowFilter,
    Session,
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,
};
