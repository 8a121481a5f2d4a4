//! Streaming spreadsheet engine
//!
//! This module writes SpreadsheetML packages through a single fixed-size
//! output buffer:
//! - Value encoders that either write a whole value or report that it does not fit
//! - Resumable part writers for the package plumbing (`[Content_Types].xml`, relationships, workbook, styles)
//! - A row orchestrator that flushes and retries without ever re-emitting bytes
//!
//! Output goes to a [`PackageSink`]: [`ZipPackage`] for files, [`MemoryPackage`]
//! for tests and in-memory use.

pub mod buffer;
pub mod cancellation;
pub mod cell_ref;
pub mod cell_writers;
pub mod memory;
pub mod options;
pub mod parts;
pub mod pool;
pub mod row_type;
pub mod sink;
pub mod styles;
pub mod workbook;
pub mod worksheet;

pub use buffer::{SpreadsheetBuffer, MIN_BUFFER_CAPACITY};
pub use cancellation::CancellationToken;
pub use cell_ref::{CellRef, MAX_COLUMNS, MAX_ROWS};
pub use cell_writers::CellValueWriter;
pub use memory::MemoryProfile;
pub use options::{
    CellReferenceMode, SpreadsheetOptions, StringMode, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE,
};
pub use parts::{
    ContentTypesXml, PartWriter, RootRelsXml, StylesXml, WorkbookRelsXml, WorkbookXml,
    WorksheetMetadata,
};
pub use pool::{CellPool, PooledCells};
pub use row_type::RowTypeInfo;
pub use sink::{MemoryPackage, PackageSink, ZipPackage, DEFAULT_COMPRESSION_LEVEL};
pub use styles::{
    Border, Color, DefaultStyling, Fill, Font, NumberFormat, Style, StyleCache, StyleId,
    MAX_NUMBER_FORMAT_LEN,
};
pub use workbook::{Spreadsheet, MAX_SHEET_NAME_LEN};
pub use worksheet::RowWriter;

use crate::error::Result;
use std::path::Path;

/// Create a spreadsheet streaming into a zip file at `path`
///
/// # Examples
///
/// ```no_run
/// use sheetstream::fast_writer::{create_fast_writer, CancellationToken, SpreadsheetOptions};
/// use sheetstream::types::CellValue;
///
/// # async fn run() -> sheetstream::Result<()> {
/// let cancel = CancellationToken::new();
/// let mut spreadsheet = create_fast_writer("output.xlsx", SpreadsheetOptions::default())?;
/// spreadsheet.start_worksheet("Sheet1", &cancel).await?;
/// spreadsheet
///     .add_row(&[CellValue::from("Alice"), CellValue::from(30)], &cancel)
///     .await?;
/// spreadsheet.finish(&cancel).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_fast_writer<P: AsRef<Path>>(
    path: P,
    options: SpreadsheetOptions,
) -> Result<Spreadsheet<ZipPackage>> {
    let package = ZipPackage::create(path, DEFAULT_COMPRESSION_LEVEL)?;
    Spreadsheet::create(package, options)
}
