//! `[Content_Types].xml`

use super::{PartWriter, WorksheetMetadata, XML_DECLARATION};
use crate::fast_writer::buffer::SpreadsheetBuffer;

const TYPES_START: &[u8] = b"<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\" />\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\" />";

const VML: &[u8] = b"<Default Extension=\"vml\" ContentType=\"application/vnd.openxmlformats-officedocument.vmlDrawing\"/>";

const STYLES: &[u8] = b"<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\" />";

const SHEET_START: &[u8] = b"<Override PartName=\"/";
const SHEET_END: &[u8] = b"\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\" />";
const COMMENT_START: &[u8] = b"<Override PartName=\"/xl/comments";
const COMMENT_END: &[u8] = b".xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml\"/>";

const FOOTER: &[u8] = b"</Types>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Header,
    Vml,
    Styles,
    Worksheets,
    Footer,
    Done,
}

impl Element {
    fn successor(self) -> Self {
        match self {
            Element::Header => Element::Vml,
            Element::Vml => Element::Styles,
            Element::Styles => Element::Worksheets,
            Element::Worksheets => Element::Footer,
            Element::Footer | Element::Done => Element::Done,
        }
    }
}

/// Package manifest: one override per worksheet and per comments part
pub struct ContentTypesXml<'a> {
    worksheets: &'a [WorksheetMetadata],
    has_styles: bool,
    next: Element,
    next_worksheet: usize,
}

impl<'a> ContentTypesXml<'a> {
    pub fn new(worksheets: &'a [WorksheetMetadata], has_styles: bool) -> Self {
        ContentTypesXml {
            worksheets,
            has_styles,
            next: Element::Header,
            next_worksheet: 0,
        }
    }

    fn has_notes(&self) -> bool {
        self.worksheets
            .iter()
            .any(|sheet| sheet.notes_file_index.is_some())
    }

    fn try_write_worksheets(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        while let Some(sheet) = self.worksheets.get(self.next_worksheet) {
            let written = buffer.try_commit(|w| {
                if !(w.bytes(SHEET_START) && w.escaped(&sheet.path) && w.bytes(SHEET_END)) {
                    return false;
                }
                match sheet.notes_file_index {
                    Some(index) => {
                        w.bytes(COMMENT_START) && w.integer(index) && w.bytes(COMMENT_END)
                    }
                    None => true,
                }
            });
            if !written {
                return false;
            }
            self.next_worksheet += 1;
        }
        true
    }
}

impl PartWriter for ContentTypesXml<'_> {
    fn entry_name(&self) -> &'static str {
        "[Content_Types].xml"
    }

    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        loop {
            let written = match self.next {
                Element::Header => {
                    buffer.try_commit(|w| w.bytes(XML_DECLARATION) && w.bytes(TYPES_START))
                }
                Element::Vml => !self.has_notes() || buffer.try_write(VML),
                Element::Styles => !self.has_styles || buffer.try_write(STYLES),
                Element::Worksheets => self.try_write_worksheets(buffer),
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

    fn header() -> String {
        format!(
            "{}{}",
            std::str::from_utf8(XML_DECLARATION).unwrap(),
            std::str::from_utf8(TYPES_START).unwrap()
        )
    }

    #[test]
    fn test_zero_worksheets() {
        let mut part = ContentTypesXml::new(&[], false);
        let (xml, _) = write_all(&mut part, 4096);
        assert_eq!(xml, format!("{}</Types>", header()));
        assert!(!xml.contains("<Override"));
    }

    #[test]
    fn test_worksheets_styles_and_comments() {
        let mut with_notes = WorksheetMetadata::new("Notes", 2);
        with_notes.notes_file_index = Some(1);
        let sheets = vec![WorksheetMetadata::new("Data", 1), with_notes];

        let mut part = ContentTypesXml::new(&sheets, true);
        let (xml, _) = write_all(&mut part, 4096);

        assert!(xml.contains("<Default Extension=\"vml\""));
        assert!(xml.contains("PartName=\"/xl/styles.xml\""));
        assert!(xml.contains("<Override PartName=\"/xl/worksheets/sheet1.xml\""));
        assert!(xml.contains("<Override PartName=\"/xl/worksheets/sheet2.xml\""));
        assert!(xml.contains("<Override PartName=\"/xl/comments1.xml\""));
        assert!(xml.ends_with("</Types>"));
    }

    #[test]
    fn test_resumes_across_flushes() {
        let sheets: Vec<_> = (1..=40)
            .map(|n| WorksheetMetadata::new(format!("S{}", n), n))
            .collect();

        let (whole, flushes) = write_all(&mut ContentTypesXml::new(&sheets, true), 1 << 16);
        assert_eq!(flushes, 0);

        let (pieces, flushes) = write_all(&mut ContentTypesXml::new(&sheets, true), 400);
        assert!(flushes > 5);
        assert_eq!(pieces, whole);
    }

    #[test]
    fn test_done_part_writes_nothing() {
        let mut part = ContentTypesXml::new(&[], false);
        let mut buffer = SpreadsheetBuffer::new(4096).unwrap();
        assert!(part.try_write(&mut buffer));
        let len = buffer.len();
        assert!(part.try_write(&mut buffer));
        assert_eq!(buffer.len(), len);
    }
}
