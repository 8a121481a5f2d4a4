//! `xl/workbook.xml`

use super::{PartWriter, WorksheetMetadata, XML_DECLARATION};
use crate::fast_writer::buffer::SpreadsheetBuffer;

const WORKBOOK_START: &[u8] = b"<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>";

const FOOTER: &[u8] = b"</sheets></workbook>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Header,
    Sheets,
    Footer,
    Done,
}

impl Element {
    fn successor(self) -> Self {
        match self {
            Element::Header => Element::Sheets,
            Element::Sheets => Element::Footer,
            Element::Footer | Element::Done => Element::Done,
        }
    }
}

/// Sheet list. Sheet N is bound to relationship `rIdN`.
pub struct WorkbookXml<'a> {
    worksheets: &'a [WorksheetMetadata],
    next: Element,
    next_worksheet: usize,
}

impl<'a> WorkbookXml<'a> {
    pub fn new(worksheets: &'a [WorksheetMetadata]) -> Self {
        WorkbookXml {
            worksheets,
            next: Element::Header,
            next_worksheet: 0,
        }
    }

    fn try_write_sheets(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        while let Some(sheet) = self.worksheets.get(self.next_worksheet) {
            let id = self.next_worksheet + 1;
            let written = buffer.try_commit(|w| {
                w.bytes(b"<sheet name=\"")
                    && w.escaped(&sheet.name)
                    && w.bytes(b"\" sheetId=\"")
                    && w.integer(id)
                    && w.bytes(b"\" r:id=\"rId")
                    && w.integer(id)
                    && w.bytes(b"\" />")
            });
            if !written {
                return false;
            }
            self.next_worksheet += 1;
        }
        true
    }
}

impl PartWriter for WorkbookXml<'_> {
    fn entry_name(&self) -> &'static str {
        "xl/workbook.xml"
    }

    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        loop {
            let written = match self.next {
                Element::Header => {
                    buffer.try_commit(|w| w.bytes(XML_DECLARATION) && w.bytes(WORKBOOK_START))
                }
                Element::Sheets => self.try_write_sheets(buffer),
                Element::Footer => buffer.try_write(FOOTER),
                Element::Done => return true,
            };
            if !written {
                return false;
            }
            self.next = self.next.successor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_writer::parts::test_support::write_all;

    #[test]
    fn test_sheet_entries() {
        let sheets = vec![
            WorksheetMetadata::new("Sales & Costs", 1),
            WorksheetMetadata::new("Q2", 2),
        ];
        let (xml, _) = write_all(&mut WorkbookXml::new(&sheets), 4096);
        assert!(xml.contains("<sheet name=\"Sales &amp; Costs\" sheetId=\"1\" r:id=\"rId1\" />"));
        assert!(xml.contains("<sheet name=\"Q2\" sheetId=\"2\" r:id=\"rId2\" />"));
        assert!(xml.ends_with("</sheets></workbook>"));
    }

    #[test]
    fn test_flush_boundaries_do_not_change_output() {
        let sheets: Vec<_> = (1..=25)
            .map(|n| WorksheetMetadata::new(format!("Sheet{}", n), n))
            .collect();
        let (whole, _) = write_all(&mut WorkbookXml::new(&sheets), 1 << 16);
        let (pieces, flushes) = write_all(&mut WorkbookXml::new(&sheets), 256);
        assert!(flushes > 1);
        assert_eq!(pieces, whole);
    }
}
