//! Excel exporter implementation - model → workbook

use super::TemplateWorkbook;
use crate::core::GridProjector;
use crate::error::ProformaResult;
use crate::types::ProformaModel;
use rust_xlsxwriter::{DocProperties, Workbook};
use std::path::Path;
use tracing::{info, warn};

/// What one sheet received
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub facts_written: usize,
    pub static_cells: usize,
}

/// What a build produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub sheets: Vec<SheetSummary>,
    /// Sheets of the template, empty when built from scratch
    pub template_sheets: Vec<String>,
    /// The template carries a VBA project that the output keeps
    pub macros: bool,
}

impl ExportSummary {
    pub fn facts_written(&self) -> usize {
        self.sheets.iter().map(|s| s.facts_written).sum()
    }
}

/// A populated workbook, not yet saved
pub enum BuiltWorkbook {
    /// Created from scratch
    Fresh(Workbook),
    /// A template with the model projected onto it
    Template(TemplateWorkbook),
}

impl BuiltWorkbook {
    pub fn save(&mut self, output_path: &Path) -> ProformaResult<()> {
        match self {
            BuiltWorkbook::Fresh(workbook) => {
                workbook.save(output_path)?;
            }
            BuiltWorkbook::Template(template) => {
                let keeps_macros = template.has_macros();
                let is_xlsm = output_path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsm"));
                if keeps_macros && !is_xlsm {
                    warn!(
                        output = %output_path.display(),
                        "template has macros; save as .xlsm to open them in Excel"
                    );
                }
                template.save(output_path)?;
            }
        }
        Ok(())
    }
}

/// Builds a workbook from a parsed model
pub struct ExcelExporter<'a> {
    model: &'a ProformaModel,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(model: &'a ProformaModel) -> Self {
        Self { model }
    }

    /// Populate a workbook in memory.
    ///
    /// Without a template, sheets are created in declared order. With one, the
    /// template is loaded and every model sheet must name one of its sheets.
    pub fn build(&self) -> ProformaResult<(BuiltWorkbook, ExportSummary)> {
        match &self.model.template {
            Some(path) => self.build_on_template(path),
            None => self.build_fresh(),
        }
    }

    fn build_fresh(&self) -> ProformaResult<(BuiltWorkbook, ExportSummary)> {
        let mut workbook = Workbook::new();
        workbook.set_properties(&self.properties());

        let projector = GridProjector::for_model(self.model);
        let mut summary = ExportSummary::default();

        for spec in &self.model.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&spec.name)?;
            let facts_written = projector.project_sheet(worksheet, spec)?;
            summary.sheets.push(SheetSummary {
                name: spec.name.clone(),
                facts_written,
                static_cells: spec.cells.len(),
            });
        }

        Ok((BuiltWorkbook::Fresh(workbook), summary))
    }

    fn build_on_template(&self, path: &Path) -> ProformaResult<(BuiltWorkbook, ExportSummary)> {
        let mut template = TemplateWorkbook::open(path)?;
        let projector = GridProjector::for_model(self.model);
        let mut summary = ExportSummary {
            template_sheets: template.sheet_names(),
            macros: template.has_macros(),
            ..ExportSummary::default()
        };

        // Every sheet must exist before any is touched
        for spec in &self.model.sheets {
            template.sheet_mut(&spec.name)?;
        }

        for spec in &self.model.sheets {
            let worksheet = template.sheet_mut(&spec.name)?;
            let facts_written = projector.project_sheet(worksheet, spec)?;
            summary.sheets.push(SheetSummary {
                name: spec.name.clone(),
                facts_written,
                static_cells: spec.cells.len(),
            });
        }

        Ok((BuiltWorkbook::Template(template), summary))
    }

    /// Build and save to `output_path`
    pub fn export(&self, output_path: &Path) -> ProformaResult<ExportSummary> {
        let (mut workbook, summary) = self.build()?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        workbook.save(output_path)?;
        info!(
            output = %output_path.display(),
            sheets = summary.sheets.len(),
            cells = summary.facts_written(),
            "saved workbook"
        );
        Ok(summary)
    }

    fn properties(&self) -> DocProperties {
        let company = &self.model.company;
        let mut properties = DocProperties::new().set_subject("Pro forma financial statements");
        if let Some(name) = &company.name {
            properties = properties.set_company(name).set_title(name);
        }
        if let Some(ticker) = &company.ticker {
            properties = properties.set_keywords(ticker);
        }
        properties
    }
}
