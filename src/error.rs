//! Error types for sheetstream

use thiserror::Error;

/// Result type alias for sheetstream operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all spreadsheet write operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// Internal invariant violated. Indicates a bug in an encoder or the
    /// orchestrator, never bad input.
    #[error("Internal contract violated: {0}")]
    Contract(String),

    /// The write was cancelled through its cancellation token
    #[error("Operation was cancelled")]
    Cancelled,

    /// Error occurred while writing the document
    #[error("Failed to write spreadsheet: {0}")]
    WriteError(String),

    /// Error reported by the zip archive writer
    #[error("Zip error: {0}")]
    ZipError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid worksheet name
    #[error("Invalid worksheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    /// A worksheet with the same name (ignoring case) already exists
    #[error("Worksheet '{0}' already exists")]
    DuplicateSheet(String),

    /// A row was added before any worksheet was started
    #[error("No active worksheet. Call start_worksheet first")]
    NoActiveWorksheet,

    /// Worksheet row limit reached
    #[error("Worksheet '{sheet}' exceeds the maximum of {max} rows")]
    RowLimitExceeded { sheet: String, max: u32 },

    /// Row has more cells than a worksheet can hold
    #[error("Row has {columns} cells, the maximum is {max}")]
    ColumnLimitExceeded { columns: usize, max: u32 },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExcelError {
    /// True for the cancellation outcome, as opposed to a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExcelError::Cancelled)
    }
}

impl From<s_zip::SZipError> for ExcelError {
    fn from(err: s_zip::SZipError) -> Self {
        ExcelError::ZipError(err.to_string())
    }
}
