//! Number formats and highlight fills
//!
//! Presentation only: nothing here changes a cell's value.

use crate::types::{CellValue, PeriodKind, Styles};
use rust_xlsxwriter::{Color, Format, FormatAlign};

/// Label fragments that mark a ratio line item
const PERCENT_MARKERS: [&str; 3] = ["Margin", "Growth", "Rate"];

/// Display format category of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Thousands-separated decimal
    Currency,
    Percent,
    /// No number format (text cells)
    General,
}

/// True when the label names a ratio (`Gross Margin`, `YoY Growth %`, `Tax Rate`).
/// Case-sensitive: `Operating expense` is not a ratio.
pub fn is_percentage_label(label: &str) -> bool {
    PERCENT_MARKERS.iter().any(|marker| label.contains(marker))
}

/// Pick the display format for a value on a line item
pub fn number_format_for(label: &str, value: &CellValue) -> NumberFormat {
    if !value.is_numeric() {
        NumberFormat::General
    } else if is_percentage_label(label) {
        NumberFormat::Percent
    } else {
        NumberFormat::Currency
    }
}

impl Styles {
    pub fn fill_for(&self, kind: PeriodKind) -> u32 {
        match kind {
            PeriodKind::Actual => self.actual_fill,
            PeriodKind::Estimate => self.estimate_fill,
        }
    }

    pub fn num_format_for(&self, format: NumberFormat) -> Option<&str> {
        match format {
            NumberFormat::Currency => Some(&self.currency_format),
            NumberFormat::Percent => Some(&self.percent_format),
            NumberFormat::General => None,
        }
    }

    /// Style of a projected fact cell
    pub fn cell_style(&self, format: NumberFormat, kind: PeriodKind) -> CellStyle {
        CellStyle {
            num_format: self.num_format_for(format).map(str::to_string),
            fill: Some(self.fill_for(kind)),
            ..CellStyle::default()
        }
    }

    /// Style of a period label in the header row
    pub fn header_style(&self, kind: PeriodKind) -> CellStyle {
        CellStyle {
            fill: Some(self.fill_for(kind)),
            bold: true,
            centered: true,
            ..CellStyle::default()
        }
    }

    pub fn date_style(&self) -> CellStyle {
        CellStyle {
            num_format: Some(self.date_format.clone()),
            centered: true,
            ..CellStyle::default()
        }
    }
}

/// Presentation of one cell, independent of the workbook backend.
///
/// Fresh workbooks turn it into a `rust_xlsxwriter::Format`; template
/// workbooks apply it on top of the cell's existing style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub num_format: Option<String>,
    /// RGB background
    pub fill: Option<u32>,
    pub bold: bool,
    pub centered: bool,
}

impl CellStyle {
    pub fn to_format(&self) -> Format {
        let mut format = Format::new();
        if let Some(rgb) = self.fill {
            format = format.set_background_color(Color::RGB(rgb));
        }
        if let Some(pattern) = &self.num_format {
            format = format.set_num_format(pattern);
        }
        if self.bold {
            format = format.set_bold();
        }
        if self.centered {
            format = format.set_align(FormatAlign::Center);
        }
        format
    }

    /// Fill as an ARGB hex string (`FFFFFFCC`)
    pub fn fill_argb(&self) -> Option<String> {
        self.fill.map(|rgb| format!("FF{:06X}", rgb))
    }
}

/// Parse an RGB hex color such as `FFFFCC` or `#1F4E79`
pub fn parse_color(text: &str) -> Option<u32> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
