//! Spreadsheet document: worksheets, styles and the package parts

use super::cancellation::CancellationToken;
use super::parts::{
    ContentTypesXml, RootRelsXml, StylesXml, WorkbookRelsXml, WorkbookXml, WorksheetMetadata,
};
use super::options::SpreadsheetOptions;
use super::pool::CellPool;
use super::row_type::RowTypeInfo;
use super::sink::PackageSink;
use super::styles::{Style, StyleCache, StyleId};
use super::worksheet::RowWriter;
use crate::error::{ExcelError, Result};
use crate::types::{RowCell, StyledCell};

/// Longest worksheet name a spreadsheet application accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A spreadsheet streamed into a package sink.
///
/// Worksheets are written one after another; starting a new worksheet closes
/// the previous one. The workbook, relationship, style and manifest parts are
/// written by [`Spreadsheet::finish`].
///
/// ```
/// use sheetstream::fast_writer::{CancellationToken, MemoryPackage, Spreadsheet, SpreadsheetOptions};
/// use sheetstream::types::CellValue;
///
/// # async fn run() -> sheetstream::Result<()> {
/// let cancel = CancellationToken::new();
/// let mut spreadsheet = Spreadsheet::create(MemoryPackage::new(), SpreadsheetOptions::default())?;
/// spreadsheet.start_worksheet("Sheet1", &cancel).await?;
/// spreadsheet.add_row(&[CellValue::from("Name"), CellValue::from(42)], &cancel).await?;
/// let package = spreadsheet.finish(&cancel).await?;
/// assert!(package.entry("xl/worksheets/sheet1.xml").is_some());
/// # Ok(())
/// # }
/// ```
pub struct Spreadsheet<S: PackageSink> {
    writer: RowWriter<S>,
    styles: StyleCache,
    pool: CellPool,
    worksheets: Vec<WorksheetMetadata>,
}

impl<S: PackageSink> Spreadsheet<S> {
    pub fn create(sink: S, options: SpreadsheetOptions) -> Result<Self> {
        options.validate()?;
        let writer = RowWriter::new(
            sink,
            options.buffer_size,
            options.cell_references,
            options.string_mode,
        )?;
        Ok(Spreadsheet {
            writer,
            styles: StyleCache::new(options.default_date_time_format.as_ref()),
            pool: CellPool::new(),
            worksheets: Vec::new(),
        })
    }

    /// Register a style for use in cells. Fails with
    /// [`ExcelError::InvalidConfig`] when its number format is rejected.
    pub fn add_style(&mut self, style: &Style) -> Result<StyleId> {
        self.styles.add_style(style)
    }

    pub fn worksheets(&self) -> &[WorksheetMetadata] {
        &self.worksheets
    }

    /// Rows written to the current worksheet
    pub fn current_row(&self) -> u32 {
        self.writer.row_count()
    }

    /// Close the current worksheet, if any, and start a new one.
    pub async fn start_worksheet(&mut self, name: &str, cancel: &CancellationToken) -> Result<()> {
        cancel.check()?;
        validate_sheet_name(name)?;
        let lowered = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|sheet| sheet.name.to_lowercase() == lowered)
        {
            return Err(ExcelError::DuplicateSheet(name.to_string()));
        }

        if self.writer.has_active_worksheet() {
            self.writer.finish_worksheet().await?;
        }

        let metadata = WorksheetMetadata::new(name, self.worksheets.len() + 1);
        log::debug!("Starting worksheet '{}' at {}", name, metadata.path);
        self.writer.start_worksheet(name, &metadata.path).await?;
        self.worksheets.push(metadata);
        Ok(())
    }

    /// Write one row to the current worksheet
    pub async fn add_row<C: RowCell>(
        &mut self,
        cells: &[C],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let defaults = self.styles.defaults();
        self.writer.add_row(cells, &defaults, cancel).await
    }

    /// Write rows in order, stopping at the first error
    pub async fn add_rows<I, R, C>(&mut self, rows: I, cancel: &CancellationToken) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[C]>,
        C: RowCell,
    {
        let defaults = self.styles.defaults();
        self.writer.add_rows(rows, &defaults, cancel).await
    }

    /// Write a value as one row using its row descriptor
    pub async fn add_as_row<T>(
        &mut self,
        item: &T,
        info: &RowTypeInfo<T>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let defaults = self.styles.defaults();
        let mut cells = self.pool.rent(info.width());
        info.fill_row(item, &mut cells)?;
        self.writer.add_row(&cells[..], &defaults, cancel).await
    }

    /// Write each value as a row, reusing one pooled cell array
    pub async fn add_range_as_rows<'a, T, I>(
        &mut self,
        items: I,
        info: &RowTypeInfo<T>,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let defaults = self.styles.defaults();
        let mut cells = self.pool.rent(info.width());
        for item in items {
            cells.clear();
            info.fill_row(item, &mut cells)?;
            self.writer.add_row(&cells[..], &defaults, cancel).await?;
        }
        Ok(())
    }

    /// Write the descriptor's header names as a row
    pub async fn add_header_row<T>(
        &mut self,
        info: &RowTypeInfo<T>,
        style: Option<StyleId>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let cells: Vec<StyledCell<'_>> = info
            .header_names()
            .iter()
            .map(|name| StyledCell::new(name.as_str(), style))
            .collect();
        self.add_row(&cells, cancel).await
    }

    /// Close the last worksheet, write the remaining parts and close the sink.
    pub async fn finish(self, cancel: &CancellationToken) -> Result<S::Output> {
        let Spreadsheet {
            mut writer,
            styles,
            worksheets,
            ..
        } = self;

        if worksheets.is_empty() {
            return Err(ExcelError::WriteError(
                "A spreadsheet must contain at least one worksheet".to_string(),
            ));
        }
        if writer.has_active_worksheet() {
            writer.finish_worksheet().await?;
        }

        let has_styles = styles.has_styles();
        writer
            .write_part(&mut WorkbookXml::new(&worksheets), cancel)
            .await?;
        writer
            .write_part(&mut WorkbookRelsXml::new(&worksheets, has_styles), cancel)
            .await?;
        if has_styles {
            writer.write_part(&mut StylesXml::new(&styles), cancel).await?;
        }
        writer.write_part(&mut RootRelsXml::new(), cancel).await?;
        writer
            .write_part(&mut ContentTypesXml::new(&worksheets, has_styles), cancel)
            .await?;

        log::debug!("Finished spreadsheet with {} worksheets", worksheets.len());
        writer.finish().await
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ExcelError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
        return Err(invalid(&format!("name contains '{}'", c)));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}
