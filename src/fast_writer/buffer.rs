//! Fixed-capacity output buffer with all-or-nothing appends

use super::sink::PackageSink;
use crate::error::{ExcelError, Result};
use std::fmt;
use std::io::Write;

/// Smallest capacity the buffer accepts. Any single escaped character fits.
pub const MIN_BUFFER_CAPACITY: usize = 16;

const SCRATCH_LEN: usize = 64;

/// Writes into a borrowed byte span, tracking how much of it is used.
///
/// Every method returns `false` once the span is too small. The caller decides
/// whether to commit what was written; a failed render is simply dropped.
pub(crate) struct SpanWriter<'a> {
    dst: &'a mut [u8],
    written: usize,
}

impl<'a> SpanWriter<'a> {
    pub fn new(dst: &'a mut [u8]) -> Self {
        SpanWriter { dst, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn bytes(&mut self, data: &[u8]) -> bool {
        let end = self.written + data.len();
        if end > self.dst.len() {
            return false;
        }
        self.dst[self.written..end].copy_from_slice(data);
        self.written = end;
        true
    }

    #[inline]
    pub fn integer<I: itoa::Integer>(&mut self, value: I) -> bool {
        let mut num_buffer = itoa::Buffer::new();
        self.bytes(num_buffer.format(value).as_bytes())
    }

    /// Formatted output without allocating
    pub fn display(&mut self, args: fmt::Arguments<'_>) -> bool {
        let mut rest: &mut [u8] = &mut self.dst[self.written..];
        let available = rest.len();
        if rest.write_fmt(args).is_err() {
            return false;
        }
        self.written += available - rest.len();
        true
    }

    /// Text content with XML escaping
    pub fn escaped(&mut self, text: &str) -> bool {
        text.chars().all(|c| self.escaped_char(c))
    }

    /// Characters XML 1.0 cannot represent are dropped.
    #[inline]
    pub fn escaped_char(&mut self, c: char) -> bool {
        match c {
            '&' => self.bytes(b"&amp;"),
            '<' => self.bytes(b"&lt;"),
            '>' => self.bytes(b"&gt;"),
            '"' => self.bytes(b"&quot;"),
            '\'' => self.bytes(b"&apos;"),
            '\t' | '\n' | '\r' => self.bytes(&[c as u8]),
            c if (c as u32) < 0x20 => true,
            '\u{FFFE}' | '\u{FFFF}' => true,
            _ => {
                let mut buf = [0; 4];
                self.bytes(c.encode_utf8(&mut buf).as_bytes())
            }
        }
    }
}

/// Stack space for a short fragment that has to be rendered before it can be
/// split across flushes.
pub(crate) struct Scratch {
    bytes: [u8; SCRATCH_LEN],
    len: usize,
}

impl Scratch {
    pub fn render(render: impl FnOnce(&mut SpanWriter<'_>) -> bool) -> Option<Self> {
        let mut bytes = [0; SCRATCH_LEN];
        let mut writer = SpanWriter::new(&mut bytes);
        if !render(&mut writer) {
            return None;
        }
        let len = writer.written();
        Some(Scratch { bytes, len })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Fixed-size byte region with a fill cursor.
///
/// Appends never write past capacity: they either succeed completely or leave
/// the committed bytes untouched. `flush` hands everything committed so far to
/// the sink and resets the cursor; it is the only place the write path waits.
pub struct SpreadsheetBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl SpreadsheetBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < MIN_BUFFER_CAPACITY {
            return Err(ExcelError::InvalidConfig(format!(
                "Buffer capacity {} is below the minimum of {} bytes",
                capacity, MIN_BUFFER_CAPACITY
            )));
        }
        Ok(SpreadsheetBuffer {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes committed and not yet flushed
    pub fn written(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Append `bytes` if they fit entirely
    #[inline]
    pub fn try_write(&mut self, bytes: &[u8]) -> bool {
        self.try_commit(|w| w.bytes(bytes))
    }

    /// Run `render` against the free space and keep the output only if it
    /// reports success.
    #[inline]
    pub(crate) fn try_commit(&mut self, render: impl FnOnce(&mut SpanWriter<'_>) -> bool) -> bool {
        let mut writer = SpanWriter::new(&mut self.data[self.len..]);
        if !render(&mut writer) {
            return false;
        }
        self.len += writer.written();
        true
    }

    /// Copy as much of `bytes[*pos..]` as fits, advancing `pos`.
    /// Returns true once everything has been copied.
    pub(crate) fn write_piece(&mut self, bytes: &[u8], pos: &mut usize) -> bool {
        let count = self.remaining().min(bytes.len() - *pos);
        self.data[self.len..self.len + count].copy_from_slice(&bytes[*pos..*pos + count]);
        self.len += count;
        *pos += count;
        *pos == bytes.len()
    }

    /// Escape as much of `text[*pos..]` as fits, advancing `pos` by whole
    /// characters. Returns true once the text is consumed.
    pub(crate) fn write_text_piece(&mut self, text: &str, pos: &mut usize) -> bool {
        let mut writer = SpanWriter::new(&mut self.data[self.len..]);
        let mut consumed = text.len() - *pos;
        for (offset, c) in text[*pos..].char_indices() {
            if !writer.escaped_char(c) {
                consumed = offset;
                break;
            }
        }
        self.len += writer.written();
        *pos += consumed;
        *pos == text.len()
    }

    /// Send committed bytes to the sink and reset the cursor.
    pub async fn flush<S: PackageSink>(&mut self, sink: &mut S) -> Result<()> {
        if self.len == 0 {
            return Ok(());
        }
        log::trace!("Flushing {} buffered bytes", self.len);
        sink.write_entry(&self.data[..self.len]).await?;
        self.len = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_writer::sink::MemoryPackage;

    #[test]
    fn test_try_write_is_all_or_nothing() {
        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        assert!(buffer.try_write(b"<row r=\"1\">"));
        assert!(!buffer.try_write(b"<c><v>1</v></c>"));
        assert_eq!(buffer.written(), b"<row r=\"1\">");
        assert_eq!(buffer.remaining(), 5);
    }

    #[test]
    fn test_rejects_tiny_capacity() {
        assert!(SpreadsheetBuffer::new(MIN_BUFFER_CAPACITY - 1).is_err());
    }

    #[test]
    fn test_xml_escaping() {
        let mut buffer = SpreadsheetBuffer::new(64).unwrap();
        assert!(buffer.try_commit(|w| w.escaped("<test>&value</test>")));
        assert_eq!(buffer.written(), b"&lt;test&gt;&amp;value&lt;/test&gt;");
    }

    #[test]
    fn test_invalid_xml_chars_dropped() {
        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        assert!(buffer.try_commit(|w| w.escaped("a\u{1}b\tc")));
        assert_eq!(buffer.written(), b"ab\tc");
    }

    #[test]
    fn test_text_piece_stops_on_char_boundary() {
        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        let text = "abcdefghijklmno\u{e9}&z";
        let mut pos = 0;

        assert!(!buffer.write_text_piece(text, &mut pos));
        assert_eq!(buffer.written(), b"abcdefghijklmno");
        assert_eq!(pos, 15);

        let mut out = buffer.written().to_vec();
        buffer.len = 0;
        assert!(buffer.write_text_piece(text, &mut pos));
        out.extend_from_slice(buffer.written());
        assert_eq!(out, "abcdefghijklmno\u{e9}&amp;z".as_bytes());
    }

    #[test]
    fn test_write_piece() {
        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        let bytes = [7u8; 40];
        let mut pos = 0;
        assert!(!buffer.write_piece(&bytes, &mut pos));
        assert_eq!(pos, 16);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_display_does_not_commit_on_overflow() {
        let mut buffer = SpreadsheetBuffer::new(16).unwrap();
        assert!(buffer.try_commit(|w| w.display(format_args!("{}", 1.5f64))));
        assert!(!buffer.try_commit(|w| w.display(format_args!("{}", "x".repeat(20)))));
        assert_eq!(buffer.written(), b"1.5");
    }

    #[tokio::test]
    async fn test_flush_is_idempotent() -> Result<()> {
        let mut sink = MemoryPackage::new();
        sink.start_entry("part.xml").await?;

        let mut buffer = SpreadsheetBuffer::new(16)?;
        assert!(buffer.try_write(b"<a/>"));
        buffer.flush(&mut sink).await?;
        buffer.flush(&mut sink).await?;

        assert!(buffer.is_empty());
        assert_eq!(sink.flush_count(), 1);
        assert_eq!(sink.entry_str("part.xml"), Some("<a/>"));
        Ok(())
    }
}
