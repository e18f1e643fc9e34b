//! Error types

use thiserror::Error;

use crate::columns::MatchMode;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a preprocessing run.
///
/// Every variant is raised before the workbook is modified.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A required header column is missing
    #[error("column not found: {keywords:?} (mode={mode})")]
    ColumnNotFound {
        keywords: Vec<String>,
        mode: MatchMode,
    },

    /// The workbook already carries the preprocess marker
    #[error("workbook has already been preprocessed (preprocessing runs once)")]
    AlreadyPreprocessed,

    /// The configured sheet index does not exist
    #[error("sheet index {0} not found")]
    SheetNotFound(usize),

    /// Worksheet model error
    #[error(transparent)]
    Core(#[from] claimsheet_core::Error),
}

/// Errors surfaced by the facade: file I/O, preprocessing and background tasks
#[derive(Debug, Error)]
pub enum Error {
    /// Worksheet model error
    #[error(transparent)]
    Core(#[from] claimsheet_core::Error),

    /// XLSX read/write error
    #[error(transparent)]
    Xlsx(#[from] claimsheet_xlsx::XlsxError),

    /// Preprocessing failed
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// The file extension is not a supported spreadsheet format
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Spawning a background thread failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked
    #[error("background task '{0}' panicked")]
    TaskPanicked(String),
}
