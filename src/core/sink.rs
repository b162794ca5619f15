//! Destination of projected cells
//!
//! The projector only knows coordinates, values and [`CellStyle`]s. Fresh
//! workbooks are written with rust_xlsxwriter and template workbooks are
//! edited in place with umya-spreadsheet; both implement [`GridSink`].

use crate::error::ProformaResult;
use crate::layout::CellRef;
use crate::style::CellStyle;
use crate::types::CellValue;
use chrono::NaiveDate;

pub trait GridSink {
    /// Name of the sheet being written
    fn sheet_name(&self) -> String;

    /// Write a number, formula (verbatim) or text, with an optional style
    fn write_value(
        &mut self,
        cell: CellRef,
        value: &CellValue,
        style: Option<&CellStyle>,
    ) -> ProformaResult<()>;

    /// Write a date as a date-formatted cell
    fn write_date(&mut self, cell: CellRef, date: NaiveDate, style: &CellStyle)
        -> ProformaResult<()>;

    fn set_column_width(&mut self, col: u16, width: f64) -> ProformaResult<()>;
}
