//! Per-kind cell encoders
//!
//! A [`CellValueWriter`] is picked from a value's kind and renders `<c>`
//! elements into a [`SpreadsheetBuffer`]. The `try_*` operations are
//! all-or-nothing: when the element does not fit they return `false` and the
//! buffer is left exactly as it was. Text values, whose encoded length is
//! unbounded, can additionally be written piece by piece across flushes.

use super::buffer::{SpanWriter, SpreadsheetBuffer};
use super::cell_ref::CellRef;
use super::options::StringMode;
use super::styles::{DefaultStyling, StyleId};
use crate::types::{CellValue, Decimal};
use std::fmt;

/// `<c r="XFD1048576" s="4294967295" t="inlineStr">`
pub(crate) const MAX_START_ELEMENT_LEN: usize = 48;

/// `<v>`, `</v>` and `</c>` around a fixed-width value
const VALUE_TAGS_LEN: usize = 11;

const MAX_INTEGER_LEN: usize = 20;
const MAX_NUMBER_LEN: usize = 24;
const MAX_DECIMAL_LEN: usize = 21;

/// Encoder for one kind of cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValueWriter {
    Null,
    Integer,
    Float,
    Double,
    Decimal,
    DateTime,
    Boolean,
    Text(StringMode),
}

impl CellValueWriter {
    /// Non-finite numbers have no representation and are written as empty cells.
    pub fn for_value(value: &CellValue<'_>, string_mode: StringMode) -> Self {
        match value {
            CellValue::Empty => CellValueWriter::Null,
            CellValue::Text(_) => CellValueWriter::Text(string_mode),
            CellValue::Int(_) | CellValue::Long(_) => CellValueWriter::Integer,
            CellValue::Float(v) if v.is_finite() => CellValueWriter::Float,
            CellValue::Double(v) if v.is_finite() => CellValueWriter::Double,
            CellValue::DateTime(v) if v.is_finite() => CellValueWriter::DateTime,
            CellValue::Float(_) | CellValue::Double(_) | CellValue::DateTime(_) => {
                CellValueWriter::Null
            }
            CellValue::Decimal(_) => CellValueWriter::Decimal,
            CellValue::Bool(_) => CellValueWriter::Boolean,
        }
    }

    /// Encoder for the cached result of a formula. Cached text always goes in
    /// `<v>` with `t="str"`.
    pub fn for_formula_value(value: &CellValue<'_>) -> Self {
        Self::for_value(value, StringMode::Str)
    }

    /// Longest value body this kind can produce, `None` when unbounded
    pub fn max_value_len(&self) -> Option<usize> {
        match self {
            CellValueWriter::Null => Some(0),
            CellValueWriter::Boolean => Some(1),
            CellValueWriter::Integer => Some(MAX_INTEGER_LEN),
            CellValueWriter::Decimal => Some(MAX_DECIMAL_LEN),
            CellValueWriter::Float | CellValueWriter::Double | CellValueWriter::DateTime => {
                Some(MAX_NUMBER_LEN)
            }
            CellValueWriter::Text(_) => None,
        }
    }

    /// Worst-case size of a whole `<c>` element of this kind
    pub fn max_cell_len(&self) -> Option<usize> {
        match self {
            CellValueWriter::Null => Some(MAX_START_ELEMENT_LEN + 1),
            CellValueWriter::Text(_) => None,
            _ => self
                .max_value_len()
                .map(|len| MAX_START_ELEMENT_LEN + VALUE_TAGS_LEN + len),
        }
    }

    /// `s` attribute value. Timestamps fall back to the date-time variant of
    /// their style, or to the document default date-time style.
    pub fn style_index(&self, style: Option<StyleId>, defaults: &DefaultStyling) -> Option<u32> {
        let index = match self {
            CellValueWriter::DateTime => style
                .map(|s| s.date_time_id())
                .or(defaults.date_time_style_id),
            _ => style.map(|s| s.id()),
        };
        index.filter(|&id| id != 0)
    }

    fn type_attribute(&self) -> &'static [u8] {
        match self {
            CellValueWriter::Boolean => b" t=\"b\"",
            CellValueWriter::Text(StringMode::Inline) => b" t=\"inlineStr\"",
            CellValueWriter::Text(StringMode::Str) => b" t=\"str\"",
            _ => b"",
        }
    }

    fn value_open_tag(&self) -> &'static [u8] {
        match self {
            CellValueWriter::Null => b"",
            CellValueWriter::Text(StringMode::Inline) => b"<is><t>",
            _ => b"<v>",
        }
    }

    fn end_element(&self) -> &'static [u8] {
        match self {
            CellValueWriter::Null => b"",
            CellValueWriter::Text(StringMode::Inline) => b"</t></is></c>",
            _ => b"</v></c>",
        }
    }

    fn write_attributes(
        &self,
        w: &mut SpanWriter<'_>,
        reference: Option<CellRef>,
        style_index: Option<u32>,
    ) -> bool {
        if !w.bytes(b"<c") {
            return false;
        }
        if let Some(reference) = reference {
            if !(w.bytes(b" r=\"") && reference.write_to(w) && w.bytes(b"\"")) {
                return false;
            }
        }
        if let Some(index) = style_index {
            if !(w.bytes(b" s=\"") && w.integer(index) && w.bytes(b"\"")) {
                return false;
            }
        }
        w.bytes(self.type_attribute())
    }

    /// Opening tag including the value's open tag; the whole element for `Null`.
    pub(crate) fn render_start_element(
        &self,
        w: &mut SpanWriter<'_>,
        reference: Option<CellRef>,
        style_index: Option<u32>,
    ) -> bool {
        if !self.write_attributes(w, reference, style_index) {
            return false;
        }
        match self {
            CellValueWriter::Null => w.bytes(b"/>"),
            _ => w.bytes(b">") && w.bytes(self.value_open_tag()),
        }
    }

    /// Opening tag of a formula cell up to and including `<f>`
    pub(crate) fn render_formula_start_element(
        &self,
        w: &mut SpanWriter<'_>,
        reference: Option<CellRef>,
        style_index: Option<u32>,
    ) -> bool {
        self.write_attributes(w, reference, style_index) && w.bytes(b"><f>")
    }

    pub(crate) fn render_end_element(&self, w: &mut SpanWriter<'_>) -> bool {
        w.bytes(self.end_element())
    }

    /// Value body. Returns false when it does not fit or the value is not of
    /// this writer's kind.
    pub(crate) fn render_value(&self, value: &CellValue<'_>, w: &mut SpanWriter<'_>) -> bool {
        match (self, value) {
            (CellValueWriter::Null, _) => true,
            (CellValueWriter::Integer, CellValue::Int(v)) => w.integer(*v),
            (CellValueWriter::Integer, CellValue::Long(v)) => w.integer(*v),
            (CellValueWriter::Float, CellValue::Float(v)) => write_number(w, *v, f64::from(*v)),
            (CellValueWriter::Double, CellValue::Double(v))
            | (CellValueWriter::DateTime, CellValue::DateTime(v)) => write_number(w, *v, *v),
            (CellValueWriter::Decimal, CellValue::Decimal(d)) => write_decimal(w, d),
            (CellValueWriter::Boolean, CellValue::Bool(b)) => {
                w.bytes(if *b { b"1" } else { b"0" })
            }
            (CellValueWriter::Text(_), CellValue::Text(s)) => w.escaped(s),
            _ => false,
        }
    }

    fn render_cell(
        &self,
        value: &CellValue<'_>,
        reference: Option<CellRef>,
        style_index: Option<u32>,
        w: &mut SpanWriter<'_>,
    ) -> bool {
        if !self.render_start_element(w, reference, style_index) {
            return false;
        }
        match self {
            CellValueWriter::Null => true,
            _ => self.render_value(value, w) && w.bytes(self.end_element()),
        }
    }

    fn try_write(
        &self,
        value: &CellValue<'_>,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        if let Some(max) = self.max_cell_len() {
            if buffer.remaining() < max {
                return false;
            }
        }
        let style_index = self.style_index(style, defaults);
        buffer.try_commit(|w| self.render_cell(value, reference, style_index, w))
    }

    /// Whole `<c>` element without a reference attribute
    pub fn try_write_cell(
        &self,
        value: &CellValue<'_>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        self.try_write(value, None, style, defaults, buffer)
    }

    /// Whole `<c>` element with its `r` attribute
    pub fn try_write_cell_with_reference(
        &self,
        value: &CellValue<'_>,
        reference: CellRef,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        self.try_write(value, Some(reference), style, defaults, buffer)
    }

    /// Whole formula cell. `self` must be the writer for `cached`
    /// (see [`CellValueWriter::for_formula_value`]).
    pub fn try_write_formula_cell(
        &self,
        formula: &str,
        cached: &CellValue<'_>,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        let style_index = self.style_index(style, defaults);
        buffer.try_commit(|w| {
            self.render_formula_start_element(w, reference, style_index)
                && w.escaped(formula_body(formula))
                && w.bytes(b"</f>")
                && match self {
                    CellValueWriter::Null => w.bytes(b"</c>"),
                    _ => {
                        w.bytes(b"<v>")
                            && self.render_value(cached, w)
                            && w.bytes(self.end_element())
                    }
                }
        })
    }

    pub fn write_start_element(
        &self,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        let style_index = self.style_index(style, defaults);
        buffer.try_commit(|w| self.render_start_element(w, reference, style_index))
    }

    pub fn write_formula_start_element(
        &self,
        reference: Option<CellRef>,
        style: Option<StyleId>,
        defaults: &DefaultStyling,
        buffer: &mut SpreadsheetBuffer,
    ) -> bool {
        let style_index = self.style_index(style, defaults);
        buffer.try_commit(|w| self.render_formula_start_element(w, reference, style_index))
    }

    pub fn can_write_value_piece_by_piece(&self) -> bool {
        matches!(self, CellValueWriter::Text(_))
    }

    /// Write as much of a text value as fits, resuming at `*pos`.
    /// Returns true once the whole value has been written.
    pub fn write_value_piece_by_piece(
        &self,
        value: &CellValue<'_>,
        buffer: &mut SpreadsheetBuffer,
        pos: &mut usize,
    ) -> bool {
        match value {
            CellValue::Text(text) => buffer.write_text_piece(text, pos),
            _ => true,
        }
    }

    /// Closes an element opened with `write_start_element`, or the cached
    /// value of a formula cell.
    pub fn try_write_end_element(&self, buffer: &mut SpreadsheetBuffer) -> bool {
        buffer.try_write(self.end_element())
    }
}

/// Formula text as stored in `<f>`, without the leading `=`
pub(crate) fn formula_body(formula: &str) -> &str {
    formula.strip_prefix('=').unwrap_or(formula)
}

/// Shortest round-trip form; exponent notation outside [1e-5, 1e15).
fn write_number<T: fmt::Display + fmt::LowerExp>(
    w: &mut SpanWriter<'_>,
    value: T,
    as_f64: f64,
) -> bool {
    let magnitude = as_f64.abs();
    if magnitude == 0.0 {
        w.bytes(b"0")
    } else if (1e-5..1e15).contains(&magnitude) {
        w.display(format_args!("{}", value))
    } else {
        w.display(format_args!("{:e}", value))
    }
}

/// Exact decimal digits, trailing fractional zeros dropped
fn write_decimal(w: &mut SpanWriter<'_>, decimal: &Decimal) -> bool {
    let mantissa = i128::from(decimal.mantissa());
    let divisor = 10u128.pow(decimal.scale());
    let magnitude = mantissa.unsigned_abs();
    let int_part = magnitude / divisor;
    let mut frac = magnitude % divisor;

    if mantissa < 0 && !w.bytes(b"-") {
        return false;
    }
    if !w.integer(int_part) {
        return false;
    }
    if frac == 0 {
        return true;
    }

    let mut digits = decimal.scale() as usize;
    while frac % 10 == 0 {
        frac /= 10;
        digits -= 1;
    }
    let mut num_buffer = itoa::Buffer::new();
    let frac_str = num_buffer.format(frac);
    w.bytes(b".")
        && (frac_str.len()..digits).all(|_| w.bytes(b"0"))
        && w.bytes(frac_str.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn render(value: &CellValue<'_>, reference: Option<CellRef>, style: Option<StyleId>) -> String {
        let writer = CellValueWriter::for_value(value, StringMode::Inline);
        let mut buffer = SpreadsheetBuffer::new(256).unwrap();
        let defaults = DefaultStyling::default();
        let ok = match reference {
            Some(r) => writer.try_write_cell_with_reference(value, r, style, &defaults, &mut buffer),
            None => writer.try_write_cell(value, style, &defaults, &mut buffer),
        };
        assert!(ok);
        String::from_utf8(buffer.written().to_vec()).unwrap()
    }

    #[test]
    fn test_cell_shapes() {
        assert_eq!(
            render(&CellValue::Int(42), Some(CellRef::new(1, 1)), None),
            "<c r=\"A1\"><v>42</v></c>"
        );
        assert_eq!(
            render(&CellValue::from("a<b"), None, None),
            "<c t=\"inlineStr\"><is><t>a&lt;b</t></is></c>"
        );
        assert_eq!(
            render(&CellValue::Bool(true), None, Some(StyleId::new(3, 3))),
            "<c s=\"3\" t=\"b\"><v>1</v></c>"
        );
        assert_eq!(
            render(&CellValue::Empty, Some(CellRef::new(2, 3)), None),
            "<c r=\"C2\"/>"
        );
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(render(&CellValue::Double(1.5), None, None), "<c><v>1.5</v></c>");
        assert_eq!(render(&CellValue::Double(-0.0), None, None), "<c><v>0</v></c>");
        assert_eq!(render(&CellValue::Float(0.1), None, None), "<c><v>0.1</v></c>");
        assert_eq!(render(&CellValue::Double(1e20), None, None), "<c><v>1e20</v></c>");
        assert_eq!(
            render(&CellValue::Long(i64::MIN), None, None),
            "<c><v>-9223372036854775808</v></c>"
        );
        assert_eq!(render(&CellValue::Double(f64::NAN), None, None), "<c/>");
    }

    #[test]
    fn test_decimal_rendering() {
        let cases = [
            (Decimal::new(-12345, 2), "-123.45"),
            (Decimal::new(5, 3), "0.005"),
            (Decimal::new(1500, 3), "1.5"),
            (Decimal::new(7, 0), "7"),
            (Decimal::new(i64::MIN, 18), "-9.223372036854775808"),
        ];
        for (decimal, expected) in cases {
            assert_eq!(
                render(&CellValue::Decimal(decimal), None, None),
                format!("<c><v>{}</v></c>", expected)
            );
        }
    }

    #[test]
    fn test_date_time_uses_default_style() {
        let value = CellValue::DateTime(45000.5);
        let writer = CellValueWriter::for_value(&value, StringMode::Inline);
        let defaults = DefaultStyling {
            date_time_style_id: Some(1),
        };
        assert_eq!(writer.style_index(None, &defaults), Some(1));
        assert_eq!(writer.style_index(Some(StyleId::new(2, 3)), &defaults), Some(3));

        let int_writer = CellValueWriter::Integer;
        assert_eq!(int_writer.style_index(None, &defaults), None);
    }

    #[test]
    fn test_identical_date_cells_encode_identically() {
        let style = Some(StyleId::new(2, 5));
        let a = render(&CellValue::DateTime(45000.25), None, style);
        let _ = render(&CellValue::Int(1), None, None);
        let b = render(&CellValue::DateTime(45000.25), None, style);
        assert_eq!(a, b);
        assert_eq!(a, "<c s=\"5\"><v>45000.25</v></c>");
    }

    #[test]
    fn test_try_write_leaves_buffer_untouched_when_short() {
        let values = [
            CellValue::Empty,
            CellValue::Int(i32::MIN),
            CellValue::Long(i64::MIN),
            CellValue::Float(1.0),
            CellValue::Double(-1.234_567_890_123_456_7e-300),
            CellValue::Decimal(Decimal::new(i64::MIN, 18)),
            CellValue::DateTime(45000.123),
            CellValue::Bool(false),
        ];
        let defaults = DefaultStyling::default();
        for value in &values {
            let writer = CellValueWriter::for_value(value, StringMode::Inline);
            let max = writer.max_cell_len().unwrap();

            let mut buffer = SpreadsheetBuffer::new(max + 4).unwrap();
            assert!(buffer.try_write(b"<row>"));
            let before = buffer.written().to_vec();

            assert!(buffer.remaining() < max);
            assert!(!writer.try_write_cell(value, None, &defaults, &mut buffer));
            assert!(!writer.try_write_cell_with_reference(
                value,
                CellRef::new(1_048_576, 16_384),
                Some(StyleId::new(u32::MAX, u32::MAX)),
                &defaults,
                &mut buffer
            ));
            assert_eq!(buffer.written(), &before[..]);
        }
    }

    #[test]
    fn test_max_lengths_hold() {
        let reference = CellRef::new(1_048_576, 16_384);
        let style = Some(StyleId::new(u32::MAX, u32::MAX));
        let defaults = DefaultStyling::default();
        let values = [
            CellValue::Long(i64::MIN),
            CellValue::Double(-1.234_567_890_123_456_7e-300),
            CellValue::Double(-0.000_012_345_678_901_234_567),
            CellValue::Decimal(Decimal::new(i64::MIN, 18)),
            CellValue::Bool(true),
        ];
        for value in &values {
            let writer = CellValueWriter::for_value(value, StringMode::Inline);
            let mut buffer = SpreadsheetBuffer::new(writer.max_cell_len().unwrap()).unwrap();
            assert!(writer.try_write_cell_with_reference(value, reference, style, &defaults, &mut buffer));
        }
    }

    #[test]
    fn test_text_short_buffer() {
        let value = CellValue::Text(Cow::Borrowed("hello world"));
        let writer = CellValueWriter::for_value(&value, StringMode::Str);
        let mut buffer = SpreadsheetBuffer::new(20).unwrap();
        assert!(!writer.try_write_cell(&value, None, &DefaultStyling::default(), &mut buffer));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_text_piece_by_piece() {
        let text = "x".repeat(50);
        let value = CellValue::from(text.as_str());
        let writer = CellValueWriter::for_value(&value, StringMode::Inline);
        assert!(writer.can_write_value_piece_by_piece());
        assert!(!CellValueWriter::Integer.can_write_value_piece_by_piece());

        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        let mut out = Vec::new();
        let mut pos = 0;
        let mut calls = 0;
        loop {
            calls += 1;
            let done = writer.write_value_piece_by_piece(&value, &mut buffer, &mut pos);
            out.extend_from_slice(buffer.written());
            buffer = SpreadsheetBuffer::new(16).unwrap();
            if done {
                break;
            }
        }
        assert_eq!(out, text.as_bytes());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_formula_cells() {
        let defaults = DefaultStyling::default();
        let mut buffer = SpreadsheetBuffer::new(256).unwrap();

        let cached = CellValue::Int(3);
        let writer = CellValueWriter::for_formula_value(&cached);
        assert!(writer.try_write_formula_cell("=SUM(A1:A2)", &cached, None, None, &defaults, &mut buffer));

        let cached = CellValue::from("ok");
        let writer = CellValueWriter::for_formula_value(&cached);
        assert!(writer.try_write_formula_cell("IF(B1>0,\"ok\",\"\")", &cached, Some(CellRef::new(1, 3)), None, &defaults, &mut buffer));

        let writer = CellValueWriter::for_formula_value(&CellValue::Empty);
        assert!(writer.try_write_formula_cell("NOW()", &CellValue::Empty, None, None, &defaults, &mut buffer));

        assert_eq!(
            std::str::from_utf8(buffer.written()).unwrap(),
            "<c><f>SUM(A1:A2)</f><v>3</v></c>\
             <c r=\"C1\" t=\"str\"><f>IF(B1&gt;0,&quot;ok&quot;,&quot;&quot;)</f><v>ok</v></c>\
             <c><f>NOW()</f></c>"
        );
    }

    #[test]
    fn test_start_and_end_elements() {
        let value = CellValue::from("hi");
        let writer = CellValueWriter::for_value(&value, StringMode::Inline);
        let defaults = DefaultStyling::default();
        let mut buffer = SpreadsheetBuffer::new(64).unwrap();
        let mut pos = 0;

        assert!(writer.write_start_element(Some(CellRef::new(1, 2)), None, &defaults, &mut buffer));
        assert!(writer.write_value_piece_by_piece(&value, &mut buffer, &mut pos));
        assert!(writer.try_write_end_element(&mut buffer));
        assert_eq!(
            buffer.written(),
            b"<c r=\"B1\" t=\"inlineStr\"><is><t>hi</t></is></c>"
        );
    }
}
