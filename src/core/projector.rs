//! Grid projection: fact tables onto fixed sheet coordinates
//!
//! Projection is two steps. [`GridProjector::plan`] resolves every fact to a
//! [`CellWrite`] without touching the workbook, so a fact with no row or column
//! in the layout fails before anything is written. [`GridProjector::apply`]
//! then performs the writes. Writes are independent of each other; the grid
//! does not depend on their order unless the layout maps two facts to one cell.

use super::GridSink;
use crate::error::{ProformaError, ProformaResult};
use crate::layout::{CellRef, SheetLayout};
use crate::style::number_format_for;
use crate::types::{CellValue, CellWrite, FactTable, Period, ProformaModel, SheetSpec, Styles};
use std::collections::BTreeMap;
use tracing::debug;

/// Writes fact tables onto worksheets
pub struct GridProjector<'a> {
    styles: &'a Styles,
    periods: &'a [Period],
}

impl<'a> GridProjector<'a> {
    pub fn new(styles: &'a Styles, periods: &'a [Period]) -> Self {
        Self { styles, periods }
    }

    pub fn for_model(model: &'a ProformaModel) -> Self {
        Self::new(&model.styles, &model.periods)
    }

    fn period(&self, sheet: &str, label: &str) -> ProformaResult<&'a Period> {
        self.periods
            .iter()
            .find(|p| p.label == label)
            .ok_or_else(|| ProformaError::UnknownPeriod {
                period: label.to_string(),
                sheet: sheet.to_string(),
            })
    }

    /// Resolve every fact to its cell, format and fill.
    ///
    /// Fails on the first line item or period the layout does not map.
    pub fn plan(
        &self,
        sheet: &str,
        facts: &FactTable,
        layout: &SheetLayout,
    ) -> ProformaResult<Vec<CellWrite>> {
        let mut writes = Vec::with_capacity(facts.len());

        for (item, period_label, value) in facts.iter() {
            let cell = CellRef::new(layout.row_for(item)?, layout.column_for(period_label)?);
            let period = self.period(sheet, period_label)?;

            writes.push(CellWrite {
                sheet: sheet.to_string(),
                cell,
                value: value.clone(),
                number_format: number_format_for(layout.label_for(item), value),
                fill: period.kind,
            });
        }

        Ok(writes)
    }

    /// Perform planned writes; returns the number of cells written
    pub fn apply<S: GridSink + ?Sized>(&self, sink: &mut S, writes: &[CellWrite]) -> ProformaResult<usize> {
        for write in writes {
            let style = self.styles.cell_style(write.number_format, write.fill);
            sink.write_value(write.cell, &write.value, Some(&style))?;
        }
        Ok(writes.len())
    }

    /// Project one fact table onto a worksheet using the given layout
    pub fn project<S: GridSink + ?Sized>(
        &self,
        sink: &mut S,
        facts: &FactTable,
        layout: &SheetLayout,
    ) -> ProformaResult<usize> {
        let sheet = sink.sheet_name();
        let writes = self.plan(&sheet, facts, layout)?;
        let written = self.apply(sink, &writes)?;
        debug!(sheet = %sheet, cells = written, "projected facts");
        Ok(written)
    }

    /// Populate a whole sheet: static cells, period headers, labels, widths, then facts.
    ///
    /// Facts are planned first so an unmapped fact aborts before the sheet is touched.
    pub fn project_sheet<S: GridSink + ?Sized>(&self, sink: &mut S, spec: &SheetSpec) -> ProformaResult<usize> {
        let writes = self.plan(&spec.name, &spec.facts, &spec.layout)?;

        write_static_cells(sink, &spec.cells)?;
        self.write_period_headers(sink, &spec.layout)?;
        write_labels(sink, &spec.layout)?;
        set_widths(sink, &spec.layout)?;

        let written = self.apply(sink, &writes)?;
        debug!(
            sheet = %spec.name,
            cells = written,
            static_cells = spec.cells.len(),
            "projected sheet"
        );
        Ok(written)
    }

    /// Period labels and fiscal year end dates, in declared period order
    fn write_period_headers<S: GridSink + ?Sized>(&self, sink: &mut S, layout: &SheetLayout) -> ProformaResult<()> {
        let date_style = self.styles.date_style();

        for period in self.periods {
            let Some(&col) = layout.columns.get(&period.label) else {
                continue;
            };

            if let Some(row) = layout.header_row {
                let style = self.styles.header_style(period.kind);
                let label = CellValue::Text(period.label.clone());
                sink.write_value(CellRef::new(row, col), &label, Some(&style))?;
            }

            if let (Some(row), Some(end_date)) = (layout.date_row, period.end_date) {
                sink.write_date(CellRef::new(row, col), end_date, &date_style)?;
            }
        }

        Ok(())
    }
}

fn set_widths<S: GridSink + ?Sized>(sink: &mut S, layout: &SheetLayout) -> ProformaResult<()> {
    if let (Some(col), Some(width)) = (layout.label_column, layout.label_width) {
        sink.set_column_width(col, width)?;
    }
    if let Some(width) = layout.value_width {
        for &col in layout.columns.values() {
            sink.set_column_width(col, width)?;
        }
    }
    Ok(())
}

fn write_static_cells<S: GridSink + ?Sized>(
    sink: &mut S,
    cells: &BTreeMap<CellRef, CellValue>,
) -> ProformaResult<()> {
    for (cell, value) in cells {
        sink.write_value(*cell, value, None)?;
    }
    Ok(())
}

fn write_labels<S: GridSink + ?Sized>(sink: &mut S, layout: &SheetLayout) -> ProformaResult<()> {
    let Some(col) = layout.label_column else {
        return Ok(());
    };
    for (item, spec) in layout.items_by_row() {
        let label = spec.label.as_deref().unwrap_or(item);
        sink.write_value(CellRef::new(spec.row, col), &CellValue::Text(label.to_string()), None)?;
    }
    Ok(())
}
