//! Document-level settings

use super::memory::MemoryProfile;
use super::styles::{NumberFormat, DATE_TIME_NUMBER_FORMAT_ID};
use crate::error::{ExcelError, Result};

/// Default output buffer size (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest buffer a document may be configured with
pub const MIN_BUFFER_SIZE: usize = 2048;

/// Which cells carry an explicit `r="A1"` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellReferenceMode {
    /// Only the first written cell of a row and the first cell after a gap
    #[default]
    Minimal,
    /// Every cell, including empty ones
    All,
}

/// How text cells are encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StringMode {
    /// `t="inlineStr"` with `<is><t>...</t></is>`
    #[default]
    Inline,
    /// `t="str"` with `<v>...</v>`
    Str,
}

#[derive(Debug, Clone)]
pub struct SpreadsheetOptions {
    pub buffer_size: usize,
    /// Number format applied to timestamps without an explicit style.
    /// `None` writes timestamps as plain numbers.
    pub default_date_time_format: Option<NumberFormat>,
    pub cell_references: CellReferenceMode,
    pub string_mode: StringMode,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        SpreadsheetOptions {
            buffer_size: DEFAULT_BUFFER_SIZE,
            default_date_time_format: Some(NumberFormat::Standard(DATE_TIME_NUMBER_FORMAT_ID)),
            cell_references: CellReferenceMode::default(),
            string_mode: StringMode::default(),
        }
    }
}

impl SpreadsheetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options sized by the `MEMORY_LIMIT_MB` environment variable
    pub fn from_env() -> Self {
        Self::default().with_memory_profile(MemoryProfile::from_env())
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_memory_profile(mut self, profile: MemoryProfile) -> Self {
        self.buffer_size = profile.buffer_size();
        self
    }

    pub fn with_default_date_time_format(mut self, format: Option<NumberFormat>) -> Self {
        self.default_date_time_format = format;
        self
    }

    pub fn with_cell_references(mut self, mode: CellReferenceMode) -> Self {
        self.cell_references = mode;
        self
    }

    pub fn with_string_mode(mut self, mode: StringMode) -> Self {
        self.string_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(ExcelError::InvalidConfig(format!(
                "buffer_size must be at least {} bytes, got {}",
                MIN_BUFFER_SIZE, self.buffer_size
            )));
        }
        if let Some(format) = &self.default_date_time_format {
            format.validate()?;
        }
        Ok(())
    }
}
