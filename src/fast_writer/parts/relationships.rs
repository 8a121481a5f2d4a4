//! `_rels/.rels` and `xl/_rels/workbook.xml.rels`

use super::{PartWriter, WorksheetMetadata, XML_DECLARATION};
use crate::fast_writer::buffer::SpreadsheetBuffer;

const RELATIONSHIPS_START: &[u8] =
    b"<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">";
const RELATIONSHIPS_END: &[u8] = b"</Relationships>";

const OFFICE_DOCUMENT: &[u8] = b"<Relationship Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
Target=\"/xl/workbook.xml\" Id=\"rId1\" />";

const WORKSHEET_START: &[u8] = b"<Relationship Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"/";
const STYLES_START: &[u8] = b"<Relationship Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"";
const ID_START: &[u8] = b" Id=\"rId";
const RELATIONSHIP_END: &[u8] = b"\" />";

/// Package root relationships: a single fragment pointing at the workbook
#[derive(Debug, Default)]
pub struct RootRelsXml {
    done: bool,
}

impl RootRelsXml {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartWriter for RootRelsXml {
    fn entry_name(&self) -> &'static str {
        "_rels/.rels"
    }

    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        if !self.done {
            self.done = buffer.try_commit(|w| {
                w.bytes(XML_DECLARATION)
                    && w.bytes(RELATIONSHIPS_START)
                    && w.bytes(OFFICE_DOCUMENT)
                    && w.bytes(RELATIONSHIPS_END)
            });
        }
        self.done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Header,
    Worksheets,
    Styles,
    Footer,
    Done,
}

impl Element {
    fn successor(self) -> Self {
        match self {
            Element::Header => Element::Worksheets,
            Element::Worksheets => Element::Styles,
            Element::Styles => Element::Footer,
            Element::Footer | Element::Done => Element::Done,
        }
    }
}

/// Workbook relationships. Worksheet N is `rIdN`; the styles part, when
/// present, takes the id after the last worksheet.
pub struct WorkbookRelsXml<'a> {
    worksheets: &'a [WorksheetMetadata],
    has_styles: bool,
    next: Element,
    next_worksheet: usize,
}

impl<'a> WorkbookRelsXml<'a> {
    pub fn new(worksheets: &'a [WorksheetMetadata], has_styles: bool) -> Self {
        WorkbookRelsXml {
            worksheets,
            has_styles,
            next: Element::Header,
            next_worksheet: 0,
        }
    }

    fn try_write_worksheets(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        while let Some(sheet) = self.worksheets.get(self.next_worksheet) {
            let id = self.next_worksheet + 1;
            let written = buffer.try_commit(|w| {
                w.bytes(WORKSHEET_START)
                    && w.escaped(&sheet.path)
                    && w.bytes(b"\"")
                    && w.bytes(ID_START)
                    && w.integer(id)
                    && w.bytes(RELATIONSHIP_END)
            });
            if !written {
                return false;
            }
            self.next_worksheet += 1;
        }
        true
    }

    fn try_write_styles(&self, buffer: &mut SpreadsheetBuffer) -> bool {
        let id = self.worksheets.len() + 1;
        buffer.try_commit(|w| {
            w.bytes(STYLES_START)
                && w.bytes(ID_START)
                && w.integer(id)
                && w.bytes(RELATIONSHIP_END)
        })
    }
}

impl PartWriter for WorkbookRelsXml<'_> {
    fn entry_name(&self) -> &'static str {
        "xl/_rels/workbook.xml.rels"
    }

    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        loop {
            let written = match self.next {
                Element::Header => {
                    buffer.try_commit(|w| w.bytes(XML_DECLARATION) && w.bytes(RELATIONSHIPS_START))
                }
                Element::Worksheets => self.try_write_worksheets(buffer),
                Element::Styles => !self.has_styles || self.try_write_styles(buffer),
                Element::Footer => buffer.try_write(RELATIONSHIPS_END),
                Element::Done => return true,
            };
            if !written {
                return false;
            }
            self.next = self.next.successor();
        }
    }
}
