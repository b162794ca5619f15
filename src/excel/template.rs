//! Template workbooks, edited in place with umya-spreadsheet
//!
//! The template is loaded whole, facts are written into its existing sheets,
//! and the book is saved under the output path. Everything the build does not
//! touch (cell styles, column widths, merged cells, other sheets, the VBA
//! project of an `.xlsm`) is written back as it was read.

use crate::core::GridSink;
use crate::error::{ProformaError, ProformaResult};
use crate::layout::{column_index_to_letter, CellRef};
use crate::style::CellStyle;
use crate::types::CellValue;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use umya_spreadsheet::{HorizontalAlignmentValues, Spreadsheet, Worksheet};

/// A loaded template
pub struct TemplateWorkbook {
    path: PathBuf,
    book: Spreadsheet,
}

impl TemplateWorkbook {
    pub fn open<P: AsRef<Path>>(path: P) -> ProformaResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ProformaError::TemplateMismatch(format!(
                "template '{}' not found",
                path.display()
            )));
        }

        let book = umya_spreadsheet::reader::xlsx::read(&path)?;
        debug!(template = %path.display(), sheets = book.get_sheet_count(), "loaded template");
        Ok(Self { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<String> {
        (0..self.book.get_sheet_count())
            .filter_map(|i| self.book.get_sheet(&i))
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    /// True when the template carries a VBA project
    pub fn has_macros(&self) -> bool {
        self.book.get_macros_code().is_some()
    }

    /// The template sheet a model sheet is projected onto
    pub fn sheet_mut(&mut self, name: &str) -> ProformaResult<&mut Worksheet> {
        if self.book.get_sheet_by_name(name).is_none() {
            return Err(ProformaError::TemplateMismatch(format!(
                "template has no sheet named '{}' (found: {})",
                name,
                self.sheet_names().join(", ")
            )));
        }
        self.book.get_sheet_by_name_mut(name).ok_or_else(|| {
            ProformaError::TemplateMismatch(format!("sheet '{}' could not be loaded", name))
        })
    }

    pub fn save(&self, output_path: &Path) -> ProformaResult<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, output_path)?;
        info!(
            template = %self.path.display(),
            output = %output_path.display(),
            macros = self.has_macros(),
            "saved template workbook"
        );
        Ok(())
    }
}

/// umya addresses cells as (column, row), both 1-based
fn coordinate(cell: CellRef) -> (u32, u32) {
    (u32::from(cell.col) + 1, cell.row + 1)
}

/// Excel 1900-system serial of a date
fn excel_serial(date: NaiveDate) -> ProformaResult<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| ProformaError::Parse("invalid Excel epoch".to_string()))?;
    Ok(date.signed_duration_since(epoch).num_days() as f64)
}

/// Layer a style over what the template cell already has
fn apply_style(sheet: &mut Worksheet, cell: CellRef, style: &CellStyle) {
    let target = sheet.get_style_mut(coordinate(cell));
    if let Some(pattern) = &style.num_format {
        target.get_number_format_mut().set_format_code(pattern.as_str());
    }
    if let Some(argb) = style.fill_argb() {
        target.set_background_color(argb);
    }
    if style.bold {
        target.get_font_mut().set_bold(true);
    }
    if style.centered {
        target
            .get_alignment_mut()
            .set_horizontal(HorizontalAlignmentValues::Center);
    }
}

impl GridSink for Worksheet {
    fn sheet_name(&self) -> String {
        self.get_name().to_string()
    }

    fn write_value(
        &mut self,
        cell: CellRef,
        value: &CellValue,
        style: Option<&CellStyle>,
    ) -> ProformaResult<()> {
        let target = self.get_cell_mut(coordinate(cell));
        match value {
            CellValue::Number(n) => {
                target.set_value_number(*n);
            }
            // umya stores formulas without the leading '='
            CellValue::Formula(f) => {
                target.set_formula(f.trim_start_matches('='));
            }
            CellValue::Text(s) => {
                target.set_value_string(s.as_str());
            }
        }
        if let Some(style) = style {
            apply_style(self, cell, style);
        }
        Ok(())
    }

    fn write_date(&mut self, cell: CellRef, date: NaiveDate, style: &CellStyle) -> ProformaResult<()> {
        let serial = excel_serial(date)?;
        self.get_cell_mut(coordinate(cell)).set_value_number(serial);
        apply_style(self, cell, style);
        Ok(())
    }

    fn set_column_width(&mut self, col: u16, width: f64) -> ProformaResult<()> {
        self.get_column_dimension_mut(&column_index_to_letter(col))
            .set_width(width);
        Ok(())
    }
}
