//! # sheetstream
//!
//! Streaming XLSX writer for large datasets.
//!
//! ## Features
//!
//! - **Bounded memory**: every byte passes through one fixed-size buffer, flushed to the sink as it fills
//! - **Resumable parts**: package parts are written by cursor-driven state machines that pick up where a flush interrupted them
//! - **Typed cells**: integers, floats, fixed-point decimals, timestamps, booleans, text and formulas
//! - **Style deduplication**: equal styles share one `cellXfs` record
//! - **Cancellation**: a shared token aborts between rows and between part fragments
//!
//! ## Quick Start
//!
//! ### Writing a file
//!
//! ```rust,no_run
//! use sheetstream::writer::ExcelWriter;
//! use sheetstream::types::CellValue;
//!
//! # async fn run() -> sheetstream::Result<()> {
//! let mut writer = ExcelWriter::create("output.xlsx").await?;
//!
//! writer.write_header_bold(["Name", "Age", "City"]).await?;
//! writer
//!     .write_row_typed(&[
//!         CellValue::from("Alice"),
//!         CellValue::Int(30),
//!         CellValue::from("New York"),
//!     ])
//!     .await?;
//!
//! writer.save().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Streaming into any sink
//!
//! ```rust
//! use sheetstream::fast_writer::{CancellationToken, MemoryPackage, Spreadsheet, SpreadsheetOptions};
//! use sheetstream::types::Cell;
//!
//! # async fn run() -> sheetstream::Result<()> {
//! let cancel = CancellationToken::new();
//! let mut spreadsheet = Spreadsheet::create(MemoryPackage::new(), SpreadsheetOptions::default())?;
//! spreadsheet.start_worksheet("Totals", &cancel).await?;
//! spreadsheet
//!     .add_row(&[Cell::new(10), Cell::new(20), Cell::formula("=A1+B1", 30)], &cancel)
//!     .await?;
//! let package = spreadsheet.finish(&cancel).await?;
//! assert!(package.entry_str("xl/worksheets/sheet1.xml").unwrap().contains("<f>A1+B1</f>"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fast_writer;
pub mod types;
pub mod writer;

pub use error::{ExcelError, Result};
pub use fast_writer::{CancellationToken, Spreadsheet, SpreadsheetOptions, Style, StyleId};
pub use types::{Cell, CellStyle, CellValue, Decimal, RowCell, StyledCell};
pub use writer::{ExcelWriter, ExcelWriterBuilder};
