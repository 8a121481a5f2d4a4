//! `xl/styles.xml`

use super::{PartWriter, XML_DECLARATION};
use crate::fast_writer::buffer::{SpanWriter, SpreadsheetBuffer};
use crate::fast_writer::styles::{Color, Font, StyleCache, XfRecord};

const STYLESHEET_START: &[u8] =
    b"<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">";

const RESERVED_FILLS: &[u8] = b"<fill><patternFill patternType=\"none\"/></fill>\
<fill><patternFill patternType=\"gray125\"/></fill>";

const BORDERS: &[u8] = b"<borders count=\"2\">\
<border><left/><right/><top/><bottom/><diagonal/></border>\
<border><left style=\"thin\"><color indexed=\"64\"/></left><right style=\"thin\"><color indexed=\"64\"/></right>\
<top style=\"thin\"><color indexed=\"64\"/></top><bottom style=\"thin\"><color indexed=\"64\"/></bottom><diagonal/></border>\
</borders>";

const CELL_STYLE_XFS: &[u8] =
    b"<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>";

const FOOTER: &[u8] = b"<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\
</styleSheet>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Header,
    NumFmtsStart,
    NumFmts,
    NumFmtsEnd,
    FontsStart,
    Fonts,
    FontsEnd,
    FillsStart,
    Fills,
    FillsEnd,
    Borders,
    CellStyleXfs,
    XfsStart,
    Xfs,
    XfsEnd,
    Footer,
    Done,
}

impl Element {
    fn successor(self) -> Self {
        match self {
            Element::Header => Element::NumFmtsStart,
            Element::NumFmtsStart => Element::NumFmts,
            Element::NumFmts => Element::NumFmtsEnd,
            Element::NumFmtsEnd => Element::FontsStart,
            Element::FontsStart => Element::Fonts,
            Element::Fonts => Element::FontsEnd,
            Element::FontsEnd => Element::FillsStart,
            Element::FillsStart => Element::Fills,
            Element::Fills => Element::FillsEnd,
            Element::FillsEnd => Element::Borders,
            Element::Borders => Element::CellStyleXfs,
            Element::CellStyleXfs => Element::XfsStart,
            Element::XfsStart => Element::Xfs,
            Element::Xfs => Element::XfsEnd,
            Element::XfsEnd => Element::Footer,
            Element::Footer | Element::Done => Element::Done,
        }
    }
}

/// Style sheet built from the registered styles
pub struct StylesXml<'a> {
    styles: &'a StyleCache,
    next: Element,
    next_index: usize,
}

impl<'a> StylesXml<'a> {
    pub fn new(styles: &'a StyleCache) -> Self {
        StylesXml {
            styles,
            next: Element::Header,
            next_index: 0,
        }
    }

    fn try_write_element(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        let styles = self.styles;
        let index = &mut self.next_index;
        let has_formats = !styles.custom_formats().is_empty();

        match self.next {
            Element::Header => {
                buffer.try_commit(|w| w.bytes(XML_DECLARATION) && w.bytes(STYLESHEET_START))
            }
            Element::NumFmtsStart => {
                !has_formats || try_write_count(buffer, b"<numFmts", styles.custom_formats().len())
            }
            Element::NumFmts => try_write_each(
                buffer,
                index,
                |i| styles.custom_formats().get_index(i),
                |w, (code, id)| {
                    w.bytes(b"<numFmt numFmtId=\"")
                        && w.integer(*id)
                        && w.bytes(b"\" formatCode=\"")
                        && w.escaped(code)
                        && w.bytes(b"\"/>")
                },
            ),
            Element::NumFmtsEnd => !has_formats || buffer.try_write(b"</numFmts>"),
            Element::FontsStart => try_write_count(buffer, b"<fonts", styles.fonts().len()),
            Element::Fonts => try_write_each(
                buffer,
                index,
                |i| styles.fonts().get_index(i),
                write_font,
            ),
            Element::FontsEnd => buffer.try_write(b"</fonts>"),
            Element::FillsStart => buffer.try_commit(|w| {
                w.bytes(b"<fills count=\"")
                    && w.integer(styles.fill_colors().len() + 2)
                    && w.bytes(b"\">")
                    && w.bytes(RESERVED_FILLS)
            }),
            Element::Fills => try_write_each(
                buffer,
                index,
                |i| styles.fill_colors().get_index(i),
                |w, color| {
                    w.bytes(b"<fill><patternFill patternType=\"solid\"><fgColor rgb=\"")
                        && write_color(w, *color)
                        && w.bytes(b"\"/><bgColor indexed=\"64\"/></patternFill></fill>")
                },
            ),
            Element::FillsEnd => buffer.try_write(b"</fills>"),
            Element::Borders => buffer.try_write(BORDERS),
            Element::CellStyleXfs => buffer.try_write(CELL_STYLE_XFS),
            Element::XfsStart => try_write_count(buffer, b"<cellXfs", styles.xfs().len()),
            Element::Xfs => try_write_each(
                buffer,
                index,
                |i| styles.xfs().get_index(i),
                write_xf,
            ),
            Element::XfsEnd => buffer.try_write(b"</cellXfs>"),
            Element::Footer => buffer.try_write(FOOTER),
            Element::Done => true,
        }
    }
}

impl PartWriter for StylesXml<'_> {
    fn entry_name(&self) -> &'static str {
        "xl/styles.xml"
    }

    fn try_write(&mut self, buffer: &mut SpreadsheetBuffer) -> bool {
        while self.next != Element::Done {
            if !self.try_write_element(buffer) {
                return false;
            }
            self.next = self.next.successor();
            self.next_index = 0;
        }
        true
    }
}

fn try_write_count(buffer: &mut SpreadsheetBuffer, start: &[u8], count: usize) -> bool {
    buffer.try_commit(|w| {
        w.bytes(start) && w.bytes(b" count=\"") && w.integer(count) && w.bytes(b"\">")
    })
}

/// One fragment per item, resuming at `*next_index`
fn try_write_each<T>(
    buffer: &mut SpreadsheetBuffer,
    next_index: &mut usize,
    get: impl Fn(usize) -> Option<T>,
    render: impl Fn(&mut SpanWriter<'_>, T) -> bool,
) -> bool {
    while let Some(item) = get(*next_index) {
        if !buffer.try_commit(|w| render(w, item)) {
            return false;
        }
        *next_index += 1;
    }
    true
}

fn write_color(w: &mut SpanWriter<'_>, color: Color) -> bool {
    w.display(format_args!("{:08X}", color.0))
}

fn write_font(w: &mut SpanWriter<'_>, font: &Font) -> bool {
    if !(w.bytes(b"<font>")
        && (!font.bold || w.bytes(b"<b/>"))
        && (!font.italic || w.bytes(b"<i/>"))
        && w.bytes(b"<sz val=\"11\"/>"))
    {
        return false;
    }
    if let Some(color) = font.color {
        if !(w.bytes(b"<color rgb=\"") && write_color(w, color) && w.bytes(b"\"/>")) {
            return false;
        }
    }
    w.bytes(b"<name val=\"Calibri\"/></font>")
}

fn write_xf(w: &mut SpanWriter<'_>, xf: &XfRecord) -> bool {
    let flags: [(&[u8], bool); 4] = [
        (b" applyNumberFormat=\"1\"", xf.num_fmt_id != 0),
        (b" applyFont=\"1\"", xf.font_id != 0),
        (b" applyFill=\"1\"", xf.fill_id != 0),
        (b" applyBorder=\"1\"", xf.border_id != 0),
    ];
    w.bytes(b"<xf numFmtId=\"")
        && w.integer(xf.num_fmt_id)
        && w.bytes(b"\" fontId=\"")
        && w.integer(xf.font_id)
        && w.bytes(b"\" fillId=\"")
        && w.integer(xf.fill_id)
        && w.bytes(b"\" borderId=\"")
        && w.integer(xf.border_id)
        && w.bytes(b"\" xfId=\"0\"")
        && flags
            .iter()
            .all(|(attribute, set)| !*set || w.bytes(attribute))
        && w.bytes(b"/>")
}
