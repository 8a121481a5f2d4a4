//! Resumable writers for the package parts
//!
//! Each part is a fixed sequence of fragments. A writer keeps an enumerated
//! cursor plus whatever index it needs inside a collection, and advances only
//! after a fragment has been committed to the buffer. `try_write` returning
//! `false` means "flush and call again": the cursor still points at the
//! fragment that did not fit.

mod content_types;
mod relationships;
mod styles_xml;
mod workbook_xml;

pub use content_types::ContentTypesXml;
pub use relationships::{RootRelsXml, WorkbookRelsXml};
pub use styles_xml::StylesXml;
pub use workbook_xml::WorkbookXml;

use super::buffer::SpreadsheetBuffer;

pub(crate) const XML_DECLARATION: &[u8] = b"<?xml version=\"1.0\" encoding=\"utf-8\"?>";

pub trait PartWriter {
    /// Entry name inside the package
    fn entry_name(&self) -> &'static str;

    /// Emit fragments from the current cursor. Returns true once the part is
    /// complete; further calls write nothing and return true.
    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool;
}

/// A worksheet as recorded in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetMetadata {
    pub name: String,
    /// Entry name, e.g. `xl/worksheets/sheet1.xml`
    pub path: String,
    /// Index of the `xl/commentsN.xml` part attached to this worksheet
    pub notes_file_index: Option<u32>,
}

impl WorksheetMetadata {
    pub fn new(name: impl Into<String>, sheet_number: usize) -> Self {
        WorksheetMetadata {
            name: name.into(),
            path: format!("xl/worksheets/sheet{}.xml", sheet_number),
            notes_file_index: None,
        }
    }
}
