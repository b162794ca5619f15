//! Pro Forma - financial statement workbooks from YAML fact tables
//!
//! This library projects tables of literal financial facts (historical figures
//! and projection formulas, keyed by line item and fiscal period) onto fixed
//! spreadsheet layouts and writes the result as an Excel workbook.
//!
//! # Features
//!
//! - Named layouts: line item → row, period → column, shared across sheets
//! - Values, text and formula strings (`=G5*(1-$B$34)`) written verbatim
//! - Percentage formats for Margin/Growth/Rate rows, thousands formats elsewhere
//! - Actual vs. estimate highlight fills
//! - Optional template workbook, edited in place so its styles and macros survive
//! - Read-back of written workbooks for verification
//!
//! Formulas are never evaluated here; the spreadsheet application does that
//! when the file is opened.
//!
//! # Example
//!
//! ```no_run
//! use royalbit_proforma::excel::ExcelExporter;
//! use royalbit_proforma::parser::parse_model;
//! use std::path::Path;
//!
//! let model = parse_model(Path::new("lululemon.yaml"))?;
//! let summary = ExcelExporter::new(&model).export(Path::new("lululemon.xlsx"))?;
//!
//! println!("Facts written: {}", summary.facts_written());
//! # Ok::<(), royalbit_proforma::error::ProformaError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod layout;
pub mod parser;
pub mod style;
pub mod types;

// Re-export commonly used types
pub use error::{ProformaError, ProformaResult};
pub use types::{CellValue, CellWrite, FactTable, Period, PeriodKind, ProformaModel, SheetSpec};
