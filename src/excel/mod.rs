//! Excel workbook output and read-back
//!
//! - Export: model → new workbook (rust_xlsxwriter), or model → template
//!   edited in place (umya-spreadsheet)
//! - Read-back: workbook → cell values, for verification and `dump`

mod exporter;
pub mod reader;
mod template;
mod xlsx;

pub use exporter::{BuiltWorkbook, ExcelExporter, ExportSummary, SheetSummary};
pub use reader::{read_grid, sheet_names, Grid};
pub use template::TemplateWorkbook;
