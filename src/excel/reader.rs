//! Read a written workbook back into cell values

use crate::error::{ProformaError, ProformaResult};
use crate::layout::CellRef;
use crate::types::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::BTreeMap;
use std::path::Path;

/// Non-empty cells of one sheet. Formula cells hold their formula text, not a result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub sheet: String,
    cells: BTreeMap<CellRef, CellValue>,
}

impl Grid {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// Look up by A1 address, e.g. `grid.get_a1("D5")`
    pub fn get_a1(&self, address: &str) -> ProformaResult<Option<&CellValue>> {
        let cell: CellRef = address.parse()?;
        Ok(self.cells.get(&cell))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &CellValue)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Sheet names of a workbook, in tab order
pub fn sheet_names(path: &Path) -> ProformaResult<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names())
}

/// Read one sheet of a workbook
pub fn read_grid(path: &Path, sheet: &str) -> ProformaResult<Grid> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(ProformaError::UnknownSheet(sheet.to_string()));
    }

    let values = workbook.worksheet_range(sheet)?;
    let formulas = workbook.worksheet_formula(sheet)?;

    let mut grid = Grid::new(sheet);
    collect_values(&values, &mut grid.cells);
    collect_formulas(&formulas, &mut grid.cells);
    Ok(grid)
}

fn offset<T: calamine::CellType>(range: &Range<T>, row: usize, col: usize) -> CellRef {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    CellRef::new(start_row + row as u32, (start_col as usize + col) as u16)
}

fn collect_values(range: &Range<Data>, cells: &mut BTreeMap<CellRef, CellValue>) {
    for (r, c, data) in range.used_cells() {
        let value = match data {
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::Text(s.clone())
            }
            Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::Error(e) => CellValue::Text(e.to_string()),
            Data::Empty => continue,
        };
        cells.insert(offset(range, r, c), value);
    }
}

fn collect_formulas(range: &Range<String>, cells: &mut BTreeMap<CellRef, CellValue>) {
    for (r, c, formula) in range.used_cells() {
        if formula.is_empty() {
            continue;
        }
        cells.insert(offset(range, r, c), CellValue::formula(formula.clone()));
    }
}
