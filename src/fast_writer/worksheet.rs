//! Row orchestration for worksheet parts
//!
//! [`RowWriter`] owns the output buffer and the sink. Every write is attempted
//! against the buffer's free space first; when it does not fit the buffer is
//! flushed and the same write is retried. Cells that cannot fit even an empty
//! buffer are written in pieces, so the concatenated output never depends on
//! where the flushes happened.

use super::buffer::{Scratch, SpanWriter, SpreadsheetBuffer};
use super::cancellation::CancellationToken;
use super::cell_ref::{CellRef, MAX_COLUMNS, MAX_ROWS};
use super::cell_writers::{formula_body, CellValueWriter};
use super::options::{CellReferenceMode, StringMode};
use super::parts::PartWriter;
use super::sink::PackageSink;
use super::styles::{DefaultStyling, StyleId};
use crate::error::{ExcelError, Result};
use crate::types::{CellValue, RowCell};

const WORKSHEET_START: &[u8] = b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheetData>";

const WORKSHEET_END: &[u8] = b"</sheetData></worksheet>";

struct ActiveSheet {
    name: String,
    row_count: u32,
}

/// Streams rows and package parts into a sink through a fixed buffer
pub struct RowWriter<S: PackageSink> {
    sink: S,
    buffer: SpreadsheetBuffer,
    cell_references: CellReferenceMode,
    string_mode: StringMode,
    sheet: Option<ActiveSheet>,
}

impl<S: PackageSink> RowWriter<S> {
    pub fn new(
        sink: S,
        buffer_size: usize,
        cell_references: CellReferenceMode,
        string_mode: StringMode,
    ) -> Result<Self> {
        Ok(RowWriter {
            sink,
            buffer: SpreadsheetBuffer::new(buffer_size)?,
            cell_references,
            string_mode,
            sheet: None,
        })
    }

    pub fn buffer(&self) -> &SpreadsheetBuffer {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn has_active_worksheet(&self) -> bool {
        self.sheet.is_some()
    }

    /// Rows written to the active worksheet
    pub fn row_count(&self) -> u32 {
        self.sheet.as_ref().map_or(0, |sheet| sheet.row_count)
    }

    /// Open a worksheet entry and write its header
    pub async fn start_worksheet(&mut self, name: &str, path: &str) -> Result<()> {
        if self.sheet.is_some() {
            return Err(ExcelError::Contract(
                "A worksheet is already open".to_string(),
            ));
        }
        self.start_entry(path).await?;
        self.write_fragment(WORKSHEET_START).await?;
        self.sheet = Some(ActiveSheet {
            name: name.to_string(),
            row_count: 0,
        });
        Ok(())
    }

    /// Close the active worksheet, returning its row count
    pub async fn finish_worksheet(&mut self) -> Result<u32> {
        let sheet = self.sheet.take().ok_or(ExcelError::NoActiveWorksheet)?;
        self.write_fragment(WORKSHEET_END).await?;
        self.buffer.flush(&mut self.sink).await?;
        log::debug!(
            "Finished worksheet '{}' with {} rows",
            sheet.name,
            sheet.row_count
        );
        Ok(sheet.row_count)
    }

    /// Write one row. Trivial cells (empty, unstyled, no formula) are skipped
    /// unless every cell carries a reference.
    pub async fn add_row<C: RowCell>(
        &mut self,
        cells: &[C],
        defaults: &DefaultStyling,
        cancel: &CancellationToken,
    ) -> Result<()> {
        cancel.check()?;
        if cells.len() > MAX_COLUMNS as usize {
            return Err(ExcelError::ColumnLimitExceeded {
                columns: cells.len(),
                max: MAX_COLUMNS,
            });
        }
        let row = {
            let sheet = self.sheet.as_mut().ok_or(ExcelError::NoActiveWorksheet)?;
            if sheet.row_count >= MAX_ROWS {
                return Err(ExcelError::RowLimitExceeded {
                    sheet: sheet.name.clone(),
                    max: MAX_ROWS,
                });
            }
            sheet.row_count += 1;
            sheet.row_count
        };

        let all_references = self.cell_references == CellReferenceMode::All;
        let has_cells = if all_references {
            !cells.is_empty()
        } else {
            cells.iter().any(|cell| !cell.is_trivial())
        };

        if !has_cells {
            return self
                .write_rendered(|w| w.bytes(b"<row r=\"") && w.integer(row) && w.bytes(b"\"/>"))
                .await;
        }

        self.write_rendered(|w| w.bytes(b"<row r=\"") && w.integer(row) && w.bytes(b"\">"))
            .await?;

        let mut after_gap = true;
        for (index, cell) in cells.iter().enumerate() {
            if !all_references && cell.is_trivial() {
                after_gap = true;
                continue;
            }
            let reference =
                (all_references || after_gap).then(|| CellRef::new(row, index as u32 + 1));
            self.write_cell(cell, reference, defaults).await?;
            after_gap = false;
        }

        self.write_fragment(b"</row>").await
    }

    /// Write rows in order, stopping at the first error
    pub async fn add_rows<I, R, C>(
        &mut self,
        rows: I,
        defaults: &DefaultStyling,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[C]>,
        C: RowCell,
    {
        for row in rows {
            self.add_row(row.as_ref(), defaults, cancel).await?;
        }
        Ok(())
    }

    /// Write a whole package part. The part's fragments must each fit in an
    /// empty buffer.
    pub async fn write_part<P: PartWriter>(
        &mut self,
        part: &mut P,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let name = part.entry_name();
        log::debug!("Writing part {}", name);
        self.start_entry(name).await?;
        loop {
            cancel.check()?;
            if part.try_write(&mut self.buffer) {
                break;
            }
            if self.buffer.is_empty() {
                return Err(ExcelError::Contract(format!(
                    "A fragment of {} does not fit in a {} byte buffer",
                    name,
                    self.buffer.capacity()
                )));
            }
            self.buffer.flush(&mut self.sink).await?;
        }
        self.buffer.flush(&mut self.sink).await
    }

    /// Flush what is left and close the sink
    pub async fn finish(mut self) -> Result<S::Output> {
        if self.sheet.is_some() {
            self.finish_worksheet().await?;
        }
        self.buffer.flush(&mut self.sink).await?;
        self.sink.finish().await
    }

    async fn start_entry(&mut self, name: &str) -> Result<()> {
        self.buffer.flush(&mut self.sink).await?;
        self.sink.start_entry(name).await
    }

    async fn write_cell<C: RowCell>(
        &mut self,
        cell: &C,
        reference: Option<CellRef>,
        defaults: &DefaultStyling,
    ) -> Result<()> {
        let value = cell.value();
        let style = cell.style();

        if let Some(formula) = cell.formula() {
            let writer = CellValueWriter::for_formula_value(value);
            let written = self
                .retry(|b| {
                    writer.try_write_formula_cell(formula, value, reference, style, defaults, b)
                })
                .await?;
            if !written {
                self.write_formula_in_pieces(writer, formula, value, reference, style, defaults)
                    .await?;
            }
            return Ok(());
        }

        let writer = CellValueWriter::for_value(value, self.string_mode);
        let written = self
            .retry(|b| match reference {
                Some(r) => writer.try_write_cell_with_reference(value, r, style, defaults, b),
                None => writer.try_write_cell(value, style, defaults, b),
            })
            .await?;
        if !written {
            self.write_cell_in_pieces(writer, value, reference, style, defaults)
                .await?;
        }
        Ok(())
    }

    async fn write_cell_in_pieces(
        &mut self,
        writer: CellValueWriter,
        value: &CellValue<'_>,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
    ) -> Result<()> {
        let started = self
            .retry(|b| writer.write_start_element(reference, style, defaults, b))
            .await?;
        if !started {
            let style_index = writer.style_index(style, defaults);
            let start = scratch(|w| writer.render_start_element(w, reference, style_index))?;
            self.write_chunked(start.as_bytes()).await?;
        }
        if writer == CellValueWriter::Null {
            return Ok(());
        }
        self.write_value(writer, value).await?;
        self.write_end_element(writer).await
    }

    async fn write_formula_in_pieces(
        &mut self,
        writer: CellValueWriter,
        formula: &str,
        cached: &CellValue<'_>,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
    ) -> Result<()> {
        let started = self
            .retry(|b| writer.write_formula_start_element(reference, style, defaults, b))
            .await?;
        if !started {
            let style_index = writer.style_index(style, defaults);
            let start =
                scratch(|w| writer.render_formula_start_element(w, reference, style_index))?;
            self.write_chunked(start.as_bytes()).await?;
        }
        self.write_text(formula_body(formula)).await?;
        if writer == CellValueWriter::Null {
            return self.write_fragment(b"</f></c>").await;
        }
        self.write_fragment(b"</f><v>").await?;
        self.write_value(writer, cached).await?;
        self.write_end_element(writer).await
    }

    async fn write_value(&mut self, writer: CellValueWriter, value: &CellValue<'_>) -> Result<()> {
        if !writer.can_write_value_piece_by_piece() {
            let rendered = scratch(|w| writer.render_value(value, w))?;
            return self.write_fragment(rendered.as_bytes()).await;
        }
        let mut pos = 0;
        while !writer.write_value_piece_by_piece(value, &mut self.buffer, &mut pos) {
            if self.buffer.is_empty() {
                return Err(no_progress(self.buffer.capacity()));
            }
            self.buffer.flush(&mut self.sink).await?;
        }
        Ok(())
    }

    async fn write_end_element(&mut self, writer: CellValueWriter) -> Result<()> {
        if !self.retry(|b| writer.try_write_end_element(b)).await? {
            let end = scratch(|w| writer.render_end_element(w))?;
            self.write_chunked(end.as_bytes()).await?;
        }
        Ok(())
    }

    /// Escaped text spread over as many flushes as it needs
    async fn write_text(&mut self, text: &str) -> Result<()> {
        let mut pos = 0;
        while !self.buffer.write_text_piece(text, &mut pos) {
            if self.buffer.is_empty() {
                return Err(no_progress(self.buffer.capacity()));
            }
            self.buffer.flush(&mut self.sink).await?;
        }
        Ok(())
    }

    /// Write fixed bytes, splitting them only if they exceed the whole buffer.
    async fn write_fragment(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.retry(|b| b.try_write(bytes)).await? {
            self.write_chunked(bytes).await?;
        }
        Ok(())
    }

    async fn write_rendered(
        &mut self,
        render: impl Fn(&mut SpanWriter<'_>) -> bool,
    ) -> Result<()> {
        if !self.retry(|b| b.try_commit(&render)).await? {
            let rendered = scratch(&render)?;
            self.write_chunked(rendered.as_bytes()).await?;
        }
        Ok(())
    }

    async fn write_chunked(&mut self, bytes: &[u8]) -> Result<()> {
        let mut pos = 0;
        while !self.buffer.write_piece(bytes, &mut pos) {
            self.buffer.flush(&mut self.sink).await?;
        }
        Ok(())
    }

    /// Attempt, flush, attempt again. `Ok(false)` means the write does not
    /// fit even an empty buffer.
    async fn retry(&mut self, attempt: impl Fn(&mut SpreadsheetBuffer) -> bool) -> Result<bool> {
        if attempt(&mut self.buffer) {
            return Ok(true);
        }
        self.buffer.flush(&mut self.sink).await?;
        Ok(attempt(&mut self.buffer))
    }
}

fn scratch(render: impl FnOnce(&mut SpanWriter<'_>) -> bool) -> Result<Scratch> {
    Scratch::render(render)
        .ok_or_else(|| ExcelError::Contract("Fragment exceeds the scratch space".to_string()))
}

fn no_progress(capacity: usize) -> ExcelError {
    ExcelError::Contract(format!(
        "No progress writing text into an empty {} byte buffer",
        capacity
    ))
}
