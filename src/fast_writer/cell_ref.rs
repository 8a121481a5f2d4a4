//! A1-style cell references

use super::buffer::SpanWriter;
use std::fmt;

/// Columns per worksheet (`XFD`)
pub const MAX_COLUMNS: u32 = 16_384;

/// Rows per worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// 1-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        CellRef { row, col }
    }

    /// Column letters, at most three for valid columns
    fn column_letters(col: u32, out: &mut [u8; 7]) -> &[u8] {
        let mut start = out.len();
        let mut n = col;
        while n > 0 && start > 0 {
            let rem = (n - 1) % 26;
            start -= 1;
            out[start] = b'A' + rem as u8;
            n = (n - 1) / 26;
        }
        &out[start..]
    }

    pub(crate) fn write_to(&self, w: &mut SpanWriter<'_>) -> bool {
        let mut letters = [0u8; 7];
        w.bytes(Self::column_letters(self.col, &mut letters)) && w.integer(self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = [0u8; 7];
        let letters = Self::column_letters(self.col, &mut letters);
        // Only ASCII uppercase letters are produced
        for &b in letters {
            write!(f, "{}", b as char)?;
        }
        write!(f, "{}", self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref() {
        assert_eq!(CellRef::new(1, 1).to_string(), "A1");
        assert_eq!(CellRef::new(1, 26).to_string(), "Z1");
        assert_eq!(CellRef::new(1, 27).to_string(), "AA1");
        assert_eq!(CellRef::new(100, 1).to_string(), "A100");
        assert_eq!(CellRef::new(MAX_ROWS, MAX_COLUMNS).to_string(), "XFD1048576");
    }

    #[test]
    fn test_write_to_span() {
        let mut out = [0u8; 8];
        let mut w = SpanWriter::new(&mut out);
        assert!(CellRef::new(12, 28).write_to(&mut w));
        assert_eq!(w.written(), 4);
        drop(w);
        assert_eq!(&out[..4], b"AB12");

        let mut small = [0u8; 3];
        let mut w = SpanWriter::new(&mut small);
        assert!(!CellRef::new(12, 28).write_to(&mut w));
    }
}
