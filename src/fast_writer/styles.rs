//! Style definitions and the style/format deduplication cache
//!
//! Every distinct [`Style`] gets a small integer id (its `cellXfs` index) the
//! first time it is registered. Registering an identical definition again
//! returns the same id. Fonts, fills and custom number formats are deduplicated
//! the same way so `styles.xml` lists each of them once.

use crate::error::{ExcelError, Result};
use crate::types::CellStyle;
use indexmap::{IndexMap, IndexSet};

/// First id available to custom number formats; lower ids are built in.
pub const FIRST_CUSTOM_NUMBER_FORMAT_ID: u32 = 164;

/// Longest custom format code a spreadsheet application accepts, in characters.
pub const MAX_NUMBER_FORMAT_LEN: usize = 255;

/// Built-in "m/d/yy h:mm" format, the default for timestamps.
pub const DATE_TIME_NUMBER_FORMAT_ID: u32 = 22;

/// Opaque handle to a registered style.
///
/// Timestamps need a number format to display as dates. When a style has no
/// number format of its own, `date_time_id` points at a variant of the same
/// style carrying the document's default date-time format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId {
    id: u32,
    date_time_id: u32,
}

impl StyleId {
    pub(crate) fn new(id: u32, date_time_id: u32) -> Self {
        StyleId { id, date_time_id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn date_time_id(&self) -> u32 {
        self.date_time_id
    }
}

/// ARGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// One of the built-in format ids (0..164)
    Standard(u32),
    /// A custom format code such as `yyyy-mm-dd`
    Custom(String),
}

impl NumberFormat {
    /// Reject built-in ids outside the built-in range and custom codes that
    /// are empty or longer than [`MAX_NUMBER_FORMAT_LEN`] characters.
    pub fn validate(&self) -> Result<()> {
        match self {
            NumberFormat::Standard(id) if *id >= FIRST_CUSTOM_NUMBER_FORMAT_ID => {
                Err(ExcelError::InvalidConfig(format!(
                    "Built-in number format id {} is out of range 0..{}",
                    id, FIRST_CUSTOM_NUMBER_FORMAT_ID
                )))
            }
            NumberFormat::Custom(code) if code.is_empty() => Err(ExcelError::InvalidConfig(
                "Number format code must not be empty".to_string(),
            )),
            NumberFormat::Custom(code) if code.chars().count() > MAX_NUMBER_FORMAT_LEN => {
                Err(ExcelError::InvalidConfig(format!(
                    "Number format code has {} characters, the maximum is {}",
                    code.chars().count(),
                    MAX_NUMBER_FORMAT_LEN
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Font {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Border {
    #[default]
    None,
    /// Thin border on all four sides
    Thin,
}

/// A style definition. Only its identity matters to the row writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub number_format: Option<NumberFormat>,
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
}

impl From<CellStyle> for Style {
    fn from(preset: CellStyle) -> Self {
        let mut style = Style::default();
        match preset {
            CellStyle::Default => {}
            CellStyle::HeaderBold | CellStyle::TextBold => style.font.bold = true,
            CellStyle::TextItalic => style.font.italic = true,
            CellStyle::NumberInteger => style.number_format = Some(NumberFormat::Standard(3)),
            CellStyle::NumberDecimal => style.number_format = Some(NumberFormat::Standard(4)),
            CellStyle::NumberCurrency => {
                style.number_format = Some(NumberFormat::Custom("$#,##0.00".to_string()))
            }
            CellStyle::NumberPercentage => {
                style.number_format = Some(NumberFormat::Standard(10))
            }
            CellStyle::DateDefault => style.number_format = Some(NumberFormat::Standard(14)),
            CellStyle::DateTimestamp => {
                style.number_format = Some(NumberFormat::Standard(DATE_TIME_NUMBER_FORMAT_ID))
            }
            CellStyle::HighlightYellow => style.fill.color = Some(Color(0xFFFF_FF00)),
            CellStyle::HighlightGreen => style.fill.color = Some(Color(0xFF00_FF00)),
            CellStyle::HighlightRed => style.fill.color = Some(Color(0xFFFF_0000)),
            CellStyle::BorderThin => style.border = Border::Thin,
        }
        style
    }
}

/// One `<xf>` record in `cellXfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct XfRecord {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
}

/// Styles applied implicitly when a cell has no explicit style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultStyling {
    pub date_time_style_id: Option<u32>,
}

/// Fills 0 and 1 are the mandatory `none` and `gray125` patterns.
const RESERVED_FILLS: u32 = 2;

pub struct StyleCache {
    styles: IndexMap<Style, StyleId>,
    xfs: IndexSet<XfRecord>,
    fonts: IndexSet<Font>,
    fill_colors: IndexSet<Color>,
    custom_formats: IndexMap<String, u32>,
    default_date_time_format: Option<u32>,
    defaults: DefaultStyling,
}

impl StyleCache {
    pub fn new(default_date_time_format: Option<&NumberFormat>) -> Self {
        let mut cache = StyleCache {
            styles: IndexMap::new(),
            xfs: IndexSet::new(),
            fonts: IndexSet::new(),
            fill_colors: IndexSet::new(),
            custom_formats: IndexMap::new(),
            default_date_time_format: None,
            defaults: DefaultStyling::default(),
        };

        cache.fonts.insert(Font::default());
        cache.xfs.insert(XfRecord::default());

        if let Some(format) = default_date_time_format {
            let num_fmt_id = cache.number_format_id(format);
            cache.default_date_time_format = Some(num_fmt_id);
            let id = cache.xf_id(XfRecord {
                num_fmt_id,
                ..XfRecord::default()
            });
            cache.defaults.date_time_style_id = Some(id);
        }

        cache
    }

    /// Register a style, or look up the id of an identical earlier one.
    pub fn add_style(&mut self, style: &Style) -> Result<StyleId> {
        if let Some(id) = self.get(style) {
            return Ok(id);
        }
        if let Some(format) = &style.number_format {
            format.validate()?;
        }

        let font_id = self.fonts.insert_full(style.font.clone()).0 as u32;
        let fill_id = match style.fill.color {
            Some(color) => RESERVED_FILLS + self.fill_colors.insert_full(color).0 as u32,
            None => 0,
        };
        let border_id = match style.border {
            Border::None => 0,
            Border::Thin => 1,
        };
        let num_fmt_id = style
            .number_format
            .as_ref()
            .map_or(0, |format| self.number_format_id(format));

        let record = XfRecord {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
        };
        let id = self.xf_id(record);

        let date_time_id = match (&style.number_format, self.default_date_time_format) {
            (None, Some(num_fmt_id)) => self.xf_id(XfRecord {
                num_fmt_id,
                ..record
            }),
            _ => id,
        };

        let style_id = StyleId::new(id, date_time_id);
        self.styles.insert(style.clone(), style_id);
        Ok(style_id)
    }

    fn get(&self, style: &Style) -> Option<StyleId> {
        self.styles.get(style).copied()
    }

    /// True once anything beyond the default cell format is registered.
    pub fn has_styles(&self) -> bool {
        self.xfs.len() > 1
    }

    pub fn defaults(&self) -> DefaultStyling {
        self.defaults
    }

    pub(crate) fn xfs(&self) -> &IndexSet<XfRecord> {
        &self.xfs
    }

    pub(crate) fn fonts(&self) -> &IndexSet<Font> {
        &self.fonts
    }

    pub(crate) fn fill_colors(&self) -> &IndexSet<Color> {
        &self.fill_colors
    }

    pub(crate) fn custom_formats(&self) -> &IndexMap<String, u32> {
        &self.custom_formats
    }

    fn number_format_id(&mut self, format: &NumberFormat) -> u32 {
        match format {
            NumberFormat::Standard(id) => *id,
            NumberFormat::Custom(code) => {
                let next = FIRST_CUSTOM_NUMBER_FORMAT_ID + self.custom_formats.len() as u32;
                *self.custom_formats.entry(code.clone()).or_insert(next)
            }
        }
    }

    fn xf_id(&mut self, record: XfRecord) -> u32 {
        self.xfs.insert_full(record).0 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> Style {
        Style {
            font: Font {
                bold: true,
                ..Font::default()
            },
            ..Style::default()
        }
    }

    #[test]
    fn test_identical_styles_share_id() {
        let mut cache = StyleCache::new(None);
        let a = cache.add_style(&bold()).unwrap();
        let b = cache.add_style(&bold()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id(), 1);
        assert_eq!(cache.get(&bold()), Some(a));
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut cache = StyleCache::new(None);
        let first = cache.add_style(&CellStyle::HighlightYellow.into()).unwrap();
        let second = cache.add_style(&CellStyle::BorderThin.into()).unwrap();
        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(cache.fill_colors().len(), 1);
    }

    #[test]
    fn test_date_time_variant_uses_default_format() {
        let mut cache = StyleCache::new(Some(&NumberFormat::Standard(DATE_TIME_NUMBER_FORMAT_ID)));
        assert_eq!(cache.defaults().date_time_style_id, Some(1));

        let id = cache.add_style(&bold()).unwrap();
        assert_ne!(id.id(), id.date_time_id());
        let record = cache.xfs()[id.date_time_id() as usize];
        assert_eq!(record.num_fmt_id, DATE_TIME_NUMBER_FORMAT_ID);
        assert_eq!(record.font_id, 1);

        let dated = cache.add_style(&CellStyle::DateDefault.into()).unwrap();
        assert_eq!(dated.id(), dated.date_time_id());
    }

    #[test]
    fn test_custom_formats_deduplicated() {
        let mut cache = StyleCache::new(None);
        let currency = cache.add_style(&CellStyle::NumberCurrency.into()).unwrap();
        let mut bold_currency: Style = CellStyle::NumberCurrency.into();
        bold_currency.font.bold = true;
        let other = cache.add_style(&bold_currency).unwrap();

        assert_ne!(currency, other);
        assert_eq!(cache.custom_formats().len(), 1);
        assert_eq!(
            cache.custom_formats().get("$#,##0.00"),
            Some(&FIRST_CUSTOM_NUMBER_FORMAT_ID)
        );
    }

    #[test]
    fn test_default_style_needs_no_styles_part() {
        let mut cache = StyleCache::new(None);
        assert!(!cache.has_styles());
        assert_eq!(cache.add_style(&Style::default()).unwrap().id(), 0);
        assert!(!cache.has_styles());
    }

    #[test]
    fn test_oversized_format_code_rejected() {
        let mut cache = StyleCache::new(None);
        let style = Style {
            number_format: Some(NumberFormat::Custom("0".repeat(MAX_NUMBER_FORMAT_LEN + 1))),
            ..Style::default()
        };
        assert!(matches!(
            cache.add_style(&style),
            Err(ExcelError::InvalidConfig(_))
        ));
        assert!(cache.custom_formats().is_empty());
        assert!(!cache.has_styles());

        let longest = Style {
            number_format: Some(NumberFormat::Custom("\"".repeat(MAX_NUMBER_FORMAT_LEN))),
            ..Style::default()
        };
        assert!(cache.add_style(&longest).is_ok());
    }

    #[test]
    fn test_builtin_format_ids_limited() {
        let mut cache = StyleCache::new(None);
        let out_of_range = Style {
            number_format: Some(NumberFormat::Standard(FIRST_CUSTOM_NUMBER_FORMAT_ID)),
            ..Style::default()
        };
        assert!(matches!(
            cache.add_style(&out_of_range),
            Err(ExcelError::InvalidConfig(_))
        ));
        assert!(NumberFormat::Standard(FIRST_CUSTOM_NUMBER_FORMAT_ID - 1)
            .validate()
            .is_ok());
        assert!(NumberFormat::Custom(String::new()).validate().is_err());
    }
}
