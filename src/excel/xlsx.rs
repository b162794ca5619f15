//! Fresh workbooks: cells written with rust_xlsxwriter

use crate::core::GridSink;
use crate::error::ProformaResult;
use crate::layout::CellRef;
use crate::style::CellStyle;
use crate::types::CellValue;
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Formula, Worksheet};

impl GridSink for Worksheet {
    fn sheet_name(&self) -> String {
        self.name()
    }

    fn write_value(
        &mut self,
        cell: CellRef,
        value: &CellValue,
        style: Option<&CellStyle>,
    ) -> ProformaResult<()> {
        let (row, col) = (cell.row, cell.col);
        let format = style.map(CellStyle::to_format);
        match (value, &format) {
            (CellValue::Number(n), Some(f)) => self.write_number_with_format(row, col, *n, f)?,
            (CellValue::Number(n), None) => self.write_number(row, col, *n)?,
            (CellValue::Formula(s), Some(f)) => {
                self.write_formula_with_format(row, col, Formula::new(s), f)?
            }
            (CellValue::Formula(s), None) => self.write_formula(row, col, Formula::new(s))?,
            (CellValue::Text(s), Some(f)) => self.write_string_with_format(row, col, s, f)?,
            (CellValue::Text(s), None) => self.write_string(row, col, s)?,
        };
        Ok(())
    }

    fn write_date(&mut self, cell: CellRef, date: NaiveDate, style: &CellStyle) -> ProformaResult<()> {
        let datetime =
            ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)?;
        self.write_datetime_with_format(cell.row, cell.col, &datetime, &style.to_format())?;
        Ok(())
    }

    fn set_column_width(&mut self, col: u16, width: f64) -> ProformaResult<()> {
        Worksheet::set_column_width(self, col, width)?;
        Ok(())
    }
}
