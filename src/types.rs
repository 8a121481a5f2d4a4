//! Type definitions for cell data

use crate::fast_writer::styles::StyleId;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// Cell style presets for formatting
///
/// Presets are plain style definitions; register one with
/// [`Spreadsheet::add_style`](crate::fast_writer::Spreadsheet::add_style) to get a [`StyleId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    /// Default style - no formatting
    Default,
    /// Bold text for headers
    HeaderBold,
    /// Integer format with thousand separator (#,##0)
    NumberInteger,
    /// Decimal format with 2 places (#,##0.00)
    NumberDecimal,
    /// Currency format ($#,##0.00)
    NumberCurrency,
    /// Percentage format (0.00%)
    NumberPercentage,
    /// Date format (MM/DD/YYYY)
    DateDefault,
    /// DateTime format (MM/DD/YYYY HH:MM:SS)
    DateTimestamp,
    /// Bold text for emphasis
    TextBold,
    /// Italic text for notes
    TextItalic,
    /// Yellow background highlight
    HighlightYellow,
    /// Green background highlight
    HighlightGreen,
    /// Red background highlight
    HighlightRed,
    /// Thin borders on all sides
    BorderThin,
}

/// Days between 0001-01-01 (CE day 1) and 1899-12-30, the serial day zero.
const SERIAL_EPOCH_DAYS_FROM_CE: i64 = 693_594;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fixed-point decimal: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i64,
    scale: u32,
}

impl Decimal {
    /// Largest supported scale. Larger scales drop trailing digits.
    pub const MAX_SCALE: u32 = 18;

    pub fn new(mut mantissa: i64, mut scale: u32) -> Self {
        while scale > Self::MAX_SCALE {
            mantissa /= 10;
            scale -= 1;
        }
        Decimal { mantissa, scale }
    }

    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

/// The content of a single cell.
///
/// Exactly one kind is active. The kind picks the encoder and the XML `t`
/// attribute. Numbers keep at most 15 significant digits once opened in a
/// spreadsheet application; more precise values are accepted but not
/// guaranteed to round-trip.
#[derive(Debug, Clone)]
pub enum CellValue<'a> {
    /// Empty cell
    Empty,
    /// Text, owned or borrowed
    Text(Cow<'a, str>),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Timestamp as serial days since 1899-12-30, time as the fraction
    DateTime(f64),
    /// Boolean value
    Bool(bool),
}

impl<'a> CellValue<'a> {
    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Build a timestamp value from a serial day number
    pub fn from_serial_date(days: f64) -> Self {
        CellValue::DateTime(days)
    }

    /// Detach from any borrowed text
    pub fn into_owned(self) -> CellValue<'static> {
        match self {
            CellValue::Empty => CellValue::Empty,
            CellValue::Text(s) => CellValue::Text(Cow::Owned(s.into_owned())),
            CellValue::Int(v) => CellValue::Int(v),
            CellValue::Long(v) => CellValue::Long(v),
            CellValue::Float(v) => CellValue::Float(v),
            CellValue::Double(v) => CellValue::Double(v),
            CellValue::Decimal(v) => CellValue::Decimal(v),
            CellValue::DateTime(v) => CellValue::DateTime(v),
            CellValue::Bool(v) => CellValue::Bool(v),
        }
    }
}

/// Convert a timestamp to serial days (1899-12-30 is day zero).
pub fn serial_date(value: NaiveDateTime) -> f64 {
    let days = i64::from(value.date().num_days_from_ce()) - SERIAL_EPOCH_DAYS_FROM_CE;
    let seconds = f64::from(value.time().num_seconds_from_midnight())
        + f64::from(value.time().nanosecond()) / 1e9;
    days as f64 + seconds / SECONDS_PER_DAY
}

// Floats compare by bit pattern so equal values always encode identically.
impl PartialEq for CellValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Long(a), CellValue::Long(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Double(a), CellValue::Double(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Decimal(a), CellValue::Decimal(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue<'_> {}

impl Hash for CellValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::Text(s) => s.hash(state),
            CellValue::Int(v) => v.hash(state),
            CellValue::Long(v) => v.hash(state),
            CellValue::Float(v) => v.to_bits().hash(state),
            CellValue::Double(v) | CellValue::DateTime(v) => v.to_bits().hash(state),
            CellValue::Decimal(v) => v.hash(state),
            CellValue::Bool(v) => v.hash(state),
        }
    }
}

impl<'a> From<&'a str> for CellValue<'a> {
    fn from(s: &'a str) -> Self {
        CellValue::Text(Cow::Borrowed(s))
    }
}

impl From<String> for CellValue<'_> {
    fn from(s: String) -> Self {
        CellValue::Text(Cow::Owned(s))
    }
}

impl<'a> From<Cow<'a, str>> for CellValue<'a> {
    fn from(s: Cow<'a, str>) -> Self {
        CellValue::Text(s)
    }
}

impl From<i32> for CellValue<'_> {
    fn from(i: i32) -> Self {
        CellValue::Int(i)
    }
}

impl From<i64> for CellValue<'_> {
    fn from(i: i64) -> Self {
        CellValue::Long(i)
    }
}

impl From<f32> for CellValue<'_> {
    fn from(f: f32) -> Self {
        CellValue::Float(f)
    }
}

impl From<f64> for CellValue<'_> {
    fn from(f: f64) -> Self {
        CellValue::Double(f)
    }
}

impl From<Decimal> for CellValue<'_> {
    fn from(d: Decimal) -> Self {
        CellValue::Decimal(d)
    }
}

impl From<bool> for CellValue<'_> {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue<'_> {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(serial_date(dt))
    }
}

impl From<NaiveDate> for CellValue<'_> {
    fn from(d: NaiveDate) -> Self {
        CellValue::DateTime(serial_date(d.and_time(chrono::NaiveTime::MIN)))
    }
}

impl<'a, T: Into<CellValue<'a>>> From<Option<T>> for CellValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// Styled cell value (a value plus an optional registered style)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyledCell<'a> {
    value: CellValue<'a>,
    style: Option<StyleId>,
}

impl<'a> StyledCell<'a> {
    /// Create a new styled cell
    pub fn new(value: impl Into<CellValue<'a>>, style: Option<StyleId>) -> Self {
        StyledCell {
            value: value.into(),
            style,
        }
    }

    pub fn value(&self) -> &CellValue<'a> {
        &self.value
    }

    pub fn style(&self) -> Option<StyleId> {
        self.style
    }
}

impl<'a> From<CellValue<'a>> for StyledCell<'a> {
    fn from(value: CellValue<'a>) -> Self {
        StyledCell { value, style: None }
    }
}

/// A cell that may carry a formula along with its cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell<'a> {
    formula: Option<Cow<'a, str>>,
    value: CellValue<'a>,
    style: Option<StyleId>,
}

impl<'a> Cell<'a> {
    pub fn new(value: impl Into<CellValue<'a>>) -> Self {
        Cell {
            formula: None,
            value: value.into(),
            style: None,
        }
    }

    /// Formula cell. A leading `=` is accepted and dropped on output.
    /// `cached` is written as the precomputed result so the document is
    /// readable without recalculation; pass `CellValue::Empty` for none.
    pub fn formula(text: impl Into<Cow<'a, str>>, cached: impl Into<CellValue<'a>>) -> Self {
        Cell {
            formula: Some(text.into()),
            value: cached.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = Some(style);
        self
    }
}

impl<'a> From<StyledCell<'a>> for Cell<'a> {
    fn from(cell: StyledCell<'a>) -> Self {
        Cell {
            formula: None,
            value: cell.value,
            style: cell.style,
        }
    }
}

/// What the row writer needs from one cell of a row.
pub trait RowCell {
    fn value(&self) -> &CellValue<'_>;

    fn style(&self) -> Option<StyleId> {
        None
    }

    fn formula(&self) -> Option<&str> {
        None
    }

    /// Empty, unstyled and without formula: nothing to emit.
    fn is_trivial(&self) -> bool {
        self.value().is_empty() && self.style().is_none() && self.formula().is_none()
    }
}

impl RowCell for CellValue<'_> {
    fn value(&self) -> &CellValue<'_> {
        self
    }
}

impl RowCell for StyledCell<'_> {
    fn value(&self) -> &CellValue<'_> {
        &self.value
    }

    fn style(&self) -> Option<StyleId> {
        self.style
    }
}

impl RowCell for Cell<'_> {
    fn value(&self) -> &CellValue<'_> {
        &self.value
    }

    fn style(&self) -> Option<StyleId> {
        self.style
    }

    fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }
}

impl<T: RowCell + ?Sized> RowCell for &T {
    fn value(&self) -> &CellValue<'_> {
        (**self).value()
    }

    fn style(&self) -> Option<StyleId> {
        (**self).style()
    }

    fn formula(&self) -> Option<&str> {
        (**self).formula()
    }
}
