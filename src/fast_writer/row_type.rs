//! Per-type row descriptors

use crate::error::{ExcelError, Result};
use crate::types::CellValue;
use std::fmt;

/// Describes how values of `T` become rows: the header names and a function
/// filling one row's cells in column order.
///
/// Build one per row type and pass it to
/// [`Spreadsheet::add_as_row`](super::Spreadsheet::add_as_row).
///
/// ```
/// use sheetstream::fast_writer::RowTypeInfo;
/// use sheetstream::types::CellValue;
///
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// let info = RowTypeInfo::new(["Name", "Age"], |p: &Person, cells| {
///     cells.push(CellValue::from(p.name.clone()));
///     cells.push(CellValue::from(p.age));
/// });
/// assert_eq!(info.width(), 2);
/// ```
pub struct RowTypeInfo<T> {
    header_names: Vec<String>,
    fill: fn(&T, &mut Vec<CellValue<'static>>),
}

impl<T> RowTypeInfo<T> {
    pub fn new<I, S>(header_names: I, fill: fn(&T, &mut Vec<CellValue<'static>>)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowTypeInfo {
            header_names: header_names.into_iter().map(Into::into).collect(),
            fill,
        }
    }

    /// Declared number of columns
    pub fn width(&self) -> usize {
        self.header_names.len()
    }

    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    /// Fill `cells` for one value. Producing more cells than the declared
    /// width is a contract violation.
    pub(crate) fn fill_row(&self, item: &T, cells: &mut Vec<CellValue<'static>>) -> Result<()> {
        (self.fill)(item, cells);
        if cells.len() > self.width() {
            return Err(ExcelError::Contract(format!(
                "Row fill produced {} cells for a row type of width {}",
                cells.len(),
                self.width()
            )));
        }
        Ok(())
    }
}

impl<T> fmt::Debug for RowTypeInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowTypeInfo")
            .field("header_names", &self.header_names)
            .finish()
    }
}

impl<T> Clone for RowTypeInfo<T> {
    fn clone(&self) -> Self {
        RowTypeInfo {
            header_names: self.header_names.clone(),
            fill: self.fill,
        }
    }
}
