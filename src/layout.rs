//! Sheet layouts: where each line item and period lands on the grid
//!
//! Rows and columns are stored zero-based, the way `rust_xlsxwriter` and
//! `calamine` address cells. Model files use spreadsheet numbering
//! (row 5 is the fifth row, column `B` is the second column).

use crate::error::{ProformaError, ProformaResult};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Largest column index accepted by Excel (`XFD`)
pub const MAX_COL: u16 = 16_383;
/// Largest row index accepted by Excel
pub const MAX_ROW: u32 = 1_048_575;

/// Convert a zero-based column index to letters (0 -> A, 26 -> AA)
pub fn column_index_to_letter(index: u16) -> String {
    let mut result = String::new();
    let mut idx = index as usize;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Convert column letters to a zero-based index (A -> 0, AA -> 26)
pub fn column_letter_to_index(letters: &str) -> ProformaResult<u16> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ProformaError::InvalidCellRef(format!(
            "'{letters}' is not a column"
        )));
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        index = index * 26 + digit;
        if index > MAX_COL as u32 + 1 {
            return Err(ProformaError::InvalidCellRef(format!(
                "column '{letters}' is beyond XFD"
            )));
        }
    }

    Ok((index - 1) as u16)
}

/// A zero-based cell coordinate, displayed in A1 notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Build from spreadsheet numbering (row 1, column 1 is `A1`)
    pub fn from_one_based(row: u32, col: u16) -> ProformaResult<Self> {
        if row == 0 || col == 0 {
            return Err(ProformaError::InvalidCellRef(format!(
                "row {row}, column {col}: numbering starts at 1"
            )));
        }
        Ok(Self::new(row - 1, col - 1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_index_to_letter(self.col), self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = ProformaError;

    /// Parse `B5` or `$B$5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Pattern: B5, $B$5, $B5, B$5
        let pattern = Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$")
            .map_err(|e| ProformaError::Parse(format!("Regex error: {}", e)))?;
        let caps = pattern
            .captures(s.trim())
            .ok_or_else(|| ProformaError::InvalidCellRef(s.to_string()))?;

        let col = column_letter_to_index(&caps[1])?;
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| ProformaError::InvalidCellRef(s.to_string()))?;
        if row == 0 || row - 1 > MAX_ROW {
            return Err(ProformaError::InvalidCellRef(s.to_string()));
        }

        Ok(Self::new(row - 1, col))
    }
}

/// Row placement of one line item
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub row: u32,
    /// Text written to the label column; defaults to the line item name
    pub label: Option<String>,
}

/// Static mapping of line items to rows and periods to columns for one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub rows: HashMap<String, RowSpec>,
    pub columns: HashMap<String, u16>,
    /// Row receiving period labels
    pub header_row: Option<u32>,
    /// Row receiving period end dates
    pub date_row: Option<u32>,
    /// Column receiving line item labels
    pub label_column: Option<u16>,
    pub label_width: Option<f64>,
    pub value_width: Option<f64>,
}

impl SheetLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Place a line item on a zero-based row
    pub fn with_row(mut self, item: impl Into<String>, row: u32) -> Self {
        self.rows.insert(item.into(), RowSpec { row, label: None });
        self
    }

    /// Place a period on a zero-based column
    pub fn with_column(mut self, period: impl Into<String>, col: u16) -> Self {
        self.columns.insert(period.into(), col);
        self
    }

    pub fn row_for(&self, item: &str) -> ProformaResult<u32> {
        self.rows
            .get(item)
            .map(|spec| spec.row)
            .ok_or_else(|| ProformaError::UnknownLineItem {
                item: item.to_string(),
                sheet: self.name.clone(),
            })
    }

    pub fn column_for(&self, period: &str) -> ProformaResult<u16> {
        self.columns
            .get(period)
            .copied()
            .ok_or_else(|| ProformaError::UnknownPeriod {
                period: period.to_string(),
                sheet: self.name.clone(),
            })
    }

    pub fn cell_for(&self, item: &str, period: &str) -> ProformaResult<CellRef> {
        Ok(CellRef::new(self.row_for(item)?, self.column_for(period)?))
    }

    /// Display label of a line item (falls back to the item name)
    pub fn label_for<'a>(&'a self, item: &'a str) -> &'a str {
        self.rows
            .get(item)
            .and_then(|spec| spec.label.as_deref())
            .unwrap_or(item)
    }

    /// Line items sorted by row, for writing the label column
    pub fn items_by_row(&self) -> Vec<(&str, &RowSpec)> {
        let mut items: Vec<_> = self.rows.iter().map(|(k, v)| (k.as_str(), v)).collect();
        items.sort_by(|a, b| a.1.row.cmp(&b.1.row).then(a.0.cmp(b.0)));
        items
    }

    /// Coordinates claimed by more than one (item, period) pair
    pub fn collisions(&self) -> Vec<CellRef> {
        let mut rows: Vec<u32> = self.rows.values().map(|s| s.row).collect();
        rows.sort_unstable();
        let dup_rows: Vec<u32> = rows.windows(2).filter(|w| w[0] == w[1]).map(|w| w[0]).collect();

        let mut cols: Vec<u16> = self.columns.values().copied().collect();
        cols.sort_unstable();
        let dup_cols: Vec<u16> = cols.windows(2).filter(|w| w[0] == w[1]).map(|w| w[0]).collect();

        let mut hits = Vec::new();
        for &row in &dup_rows {
            for &col in &cols {
                hits.push(CellRef::new(row, col));
            }
        }
        for &col in &dup_cols {
            for &row in &rows {
                hits.push(CellRef::new(row, col));
            }
        }
        hits.sort();
        hits.dedup();
        hits
    }
}
