//! File-backed spreadsheet writing
//!
//! [`ExcelWriter`] wraps a [`Spreadsheet`] streaming into a zip file. Rows go
//! through the fixed-size buffer straight to disk, so memory stays flat no
//! matter how many rows are written.

use crate::error::Result;
use crate::fast_writer::{
    CancellationToken, MemoryProfile, Spreadsheet, SpreadsheetOptions, Style, StyleId, ZipPackage,
    DEFAULT_COMPRESSION_LEVEL,
};
use crate::types::{CellStyle, CellValue, StyledCell};
use std::path::{Path, PathBuf};

/// Sheet created when no name is configured
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Streaming spreadsheet file writer
///
/// # Examples
///
/// ```no_run
/// use sheetstream::writer::ExcelWriter;
///
/// # async fn run() -> sheetstream::Result<()> {
/// let mut writer = ExcelWriter::create("output.xlsx").await?;
///
/// for _ in 0..1_000_000 {
///     writer.write_row(["Name", "Age", "Email"]).await?;
/// }
///
/// writer.save().await?;
/// # Ok(())
/// # }
/// ```
pub struct ExcelWriter {
    inner: Spreadsheet<ZipPackage>,
    current_sheet_name: String,
    cancel: CancellationToken,
}

impl ExcelWriter {
    /// Create a writer with default settings and a first sheet named `Sheet1`
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        ExcelWriterBuilder::new(path).build().await
    }

    /// Write a row of text cells
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetstream::writer::ExcelWriter;
    ///
    /// # async fn run() -> sheetstream::Result<()> {
    /// let mut writer = ExcelWriter::create("output.xlsx").await?;
    /// writer.write_row(["Alice", "30", "New York"]).await?;
    /// writer.write_row(["Bob", "25", "San Francisco"]).await?;
    /// writer.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_row<I, S>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cells: Vec<CellValue<'static>> = data
            .into_iter()
            .map(|s| CellValue::from(s.as_ref().to_string()))
            .collect();
        self.inner.add_row(&cells, &self.cancel).await
    }

    /// Write several rows of text cells
    pub async fn write_rows_batch<I, R, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row in rows {
            self.write_row(row).await?;
        }
        Ok(())
    }

    /// Write a row of typed values
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetstream::writer::ExcelWriter;
    /// use sheetstream::types::CellValue;
    ///
    /// # async fn run() -> sheetstream::Result<()> {
    /// let mut writer = ExcelWriter::create("output.xlsx").await?;
    /// writer
    ///     .write_row_typed(&[
    ///         CellValue::from("Alice"),
    ///         CellValue::Int(30),
    ///         CellValue::Double(1234.56),
    ///     ])
    ///     .await?;
    /// writer.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_row_typed(&mut self, cells: &[CellValue<'_>]) -> Result<()> {
        self.inner.add_row(cells, &self.cancel).await
    }

    /// Write several rows of typed values
    pub async fn write_rows_typed_batch(&mut self, rows: &[Vec<CellValue<'_>>]) -> Result<()> {
        for row in rows {
            self.write_row_typed(row).await?;
        }
        Ok(())
    }

    /// Write a row where every cell carries its own style preset
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetstream::writer::ExcelWriter;
    /// use sheetstream::types::{CellStyle, CellValue};
    ///
    /// # async fn run() -> sheetstream::Result<()> {
    /// let mut writer = ExcelWriter::create("output.xlsx").await?;
    /// writer
    ///     .write_row_styled(&[
    ///         (CellValue::from("Total"), CellStyle::TextBold),
    ///         (CellValue::Double(0.25), CellStyle::NumberPercentage),
    ///     ])
    ///     .await?;
    /// writer.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_row_styled(&mut self, cells: &[(CellValue<'_>, CellStyle)]) -> Result<()> {
        let mut styled: Vec<StyledCell<'_>> = Vec::with_capacity(cells.len());
        for (value, style) in cells {
            styled.push(StyledCell::new(value.clone(), self.style_id(*style)?));
        }
        self.inner.add_row(&styled, &self.cancel).await
    }

    /// Write a row with the same style on every cell
    pub async fn write_row_with_style(
        &mut self,
        values: &[CellValue<'_>],
        style: CellStyle,
    ) -> Result<()> {
        let style_id = self.style_id(style)?;
        let styled: Vec<StyledCell<'_>> = values
            .iter()
            .map(|value| StyledCell::new(value.clone(), style_id))
            .collect();
        self.inner.add_row(&styled, &self.cancel).await
    }

    /// Write a header row without formatting
    ///
    /// For bold headers use [`write_header_bold`](Self::write_header_bold).
    pub async fn write_header<I, S>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_row(headers).await
    }

    /// Write a header row in bold
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetstream::writer::ExcelWriter;
    ///
    /// # async fn run() -> sheetstream::Result<()> {
    /// let mut writer = ExcelWriter::create("output.xlsx").await?;
    /// writer.write_header_bold(["ID", "Name", "Email"]).await?;
    /// writer.write_row(["1", "Alice", "alice@example.com"]).await?;
    /// writer.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_header_bold<I, S>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bold = self.style_id(CellStyle::HeaderBold)?;
        let cells: Vec<StyledCell<'static>> = headers
            .into_iter()
            .map(|h| StyledCell::new(h.as_ref().to_string(), bold))
            .collect();
        self.inner.add_row(&cells, &self.cancel).await
    }

    /// Finish the current sheet and switch to a new one
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetstream::writer::ExcelWriter;
    ///
    /// # async fn run() -> sheetstream::Result<()> {
    /// let mut writer = ExcelWriter::create("output.xlsx").await?;
    /// writer.write_row(["Data on Sheet1"]).await?;
    ///
    /// writer.add_sheet("Sheet2").await?;
    /// writer.write_row(["Data on Sheet2"]).await?;
    ///
    /// writer.save().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_sheet(&mut self, name: &str) -> Result<()> {
        self.inner.start_worksheet(name, &self.cancel).await?;
        self.current_sheet_name = name.to_string();
        Ok(())
    }

    /// Write the package parts and close the file. Returns the file path.
    pub async fn save(self) -> Result<PathBuf> {
        self.inner.finish(&self.cancel).await
    }

    /// Rows written to the current sheet
    pub fn current_row(&self) -> u32 {
        self.inner.current_row()
    }

    pub fn current_sheet_name(&self) -> &str {
        &self.current_sheet_name
    }

    /// Token that aborts pending writes of this writer when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn style_id(&mut self, style: CellStyle) -> Result<Option<StyleId>> {
        match style {
            CellStyle::Default => Ok(None),
            preset => self.inner.add_style(&Style::from(preset)).map(Some),
        }
    }
}

/// Builder for configured [`ExcelWriter`]s
///
/// # Examples
///
/// ```no_run
/// use sheetstream::writer::ExcelWriterBuilder;
///
/// # async fn run() -> sheetstream::Result<()> {
/// let mut writer = ExcelWriterBuilder::new("report.xlsx")
///     .with_sheet_name("Report")
///     .with_compression_level(1)
///     .with_buffer_size(32 * 1024)
///     .build()
///     .await?;
/// writer.write_header_bold(["Month", "Revenue"]).await?;
/// writer.save().await?;
/// # Ok(())
/// # }
/// ```
pub struct ExcelWriterBuilder {
    path: PathBuf,
    sheet_name: Option<String>,
    compression_level: u32,
    options: SpreadsheetOptions,
}

impl ExcelWriterBuilder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ExcelWriterBuilder {
            path: path.as_ref().to_path_buf(),
            sheet_name: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            options: SpreadsheetOptions::default(),
        }
    }

    /// Name of the first sheet
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Deflate level, 0 (store) to 9 (smallest). Larger values are clamped.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.options = self.options.with_buffer_size(size);
        self
    }

    /// Size the buffer from a memory profile
    pub fn with_memory_profile(mut self, profile: MemoryProfile) -> Self {
        self.options = self.options.with_memory_profile(profile);
        self
    }

    /// Replace all document options at once
    pub fn with_options(mut self, options: SpreadsheetOptions) -> Self {
        self.options = options;
        self
    }

    /// Create the file and start the first sheet
    pub async fn build(self) -> Result<ExcelWriter> {
        self.options.validate()?;
        let package = ZipPackage::create(&self.path, self.compression_level)?;
        let mut inner = Spreadsheet::create(package, self.options)?;

        let sheet_name = self
            .sheet_name
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        let cancel = CancellationToken::new();
        inner.start_worksheet(&sheet_name, &cancel).await?;

        Ok(ExcelWriter {
            inner,
            current_sheet_name: sheet_name,
            cancel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExcelError;
    use s_zip::StreamingZipReader;
    use tempfile::TempDir;

    fn read_entry(path: &Path, name: &str) -> String {
        let mut reader = StreamingZipReader::open(path).unwrap();
        String::from_utf8(reader.read_entry_by_name(name).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_writer_creation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("created.xlsx");
        let writer = ExcelWriter::create(&path).await.unwrap();
        assert_eq!(writer.current_sheet_name(), "Sheet1");
        assert_eq!(writer.current_row(), 0);
        assert_eq!(writer.save().await.unwrap(), path);
    }

    #[tokio::test]
    async fn test_write_rows_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.xlsx");
        let mut writer = ExcelWriter::create(&path).await.unwrap();

        writer.write_header(["Name", "Age"]).await.unwrap();
        writer
            .write_rows_batch(vec![vec!["Alice", "30"], vec!["Bob", "25"]])
            .await
            .unwrap();
        writer
            .write_row_typed(&[CellValue::from("Carol"), CellValue::Int(35)])
            .await
            .unwrap();
        assert_eq!(writer.current_row(), 4);
        writer.save().await.unwrap();

        let sheet = read_entry(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<row r="2"><c r="A2" t="inlineStr"><is><t>Alice</t></is></c>"#));
        assert!(sheet.contains("<v>35</v>"));
        assert!(sheet.ends_with("</sheetData></worksheet>"));
    }

    #[tokio::test]
    async fn test_styled_rows_register_styles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("styled.xlsx");
        let mut writer = ExcelWriter::create(&path).await.unwrap();

        writer.write_header_bold(["Total"]).await.unwrap();
        writer
            .write_row_styled(&[
                (CellValue::Int(1), CellStyle::Default),
                (CellValue::Double(0.5), CellStyle::NumberPercentage),
            ])
            .await
            .unwrap();
        writer
            .write_row_with_style(&[CellValue::Int(7)], CellStyle::TextBold)
            .await
            .unwrap();
        writer.save().await.unwrap();

        let sheet = read_entry(&path, "xl/worksheets/sheet1.xml");
        let styles = read_entry(&path, "xl/styles.xml");
        assert!(sheet.contains(r#" s=""#));
        assert!(styles.contains(r#"<b/>"#));
        assert!(styles.contains(r#"numFmtId="10""#));
    }

    #[tokio::test]
    async fn test_multiple_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheets.xlsx");
        let mut writer = ExcelWriterBuilder::new(&path)
            .with_sheet_name("First")
            .build()
            .await
            .unwrap();

        writer.write_row(["one"]).await.unwrap();
        writer.add_sheet("Second").await.unwrap();
        assert_eq!(writer.current_row(), 0);
        writer.write_row(["two"]).await.unwrap();

        let err = writer.add_sheet("second").await.unwrap_err();
        assert!(matches!(err, ExcelError::DuplicateSheet(_)));
        writer.save().await.unwrap();

        let workbook = read_entry(&path, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="First" sheetId="1" r:id="rId1" />"#));
        assert!(workbook.contains(r#"<sheet name="Second" sheetId="2" r:id="rId2" />"#));
        assert!(read_entry(&path, "xl/worksheets/sheet2.xml").contains("two"));
    }

    #[tokio::test]
    async fn test_builder_rejects_small_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.xlsx");
        let result = ExcelWriterBuilder::new(&path)
            .with_buffer_size(100)
            .build()
            .await;
        assert!(matches!(result, Err(ExcelError::InvalidConfig(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cancelled_writer_stops() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cancelled.xlsx");
        let mut writer = ExcelWriter::create(&path).await.unwrap();
        writer.write_row(["before"]).await.unwrap();

        writer.cancellation_token().cancel();
        let err = writer.write_row(["after"]).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(writer.current_row(), 1);
    }
}
