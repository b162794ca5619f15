use crate::error::ProformaResult;
use crate::excel::{read_grid, sheet_names, ExcelExporter, ExportSummary};
use crate::parser;
use crate::types::{CellValue, ProformaModel};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Display form of a cell value for terminal output. Numbers print exactly
/// as read back, so `dump` shows what the workbook holds.
fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => n.to_string(),
        CellValue::Formula(f) => f.clone(),
        CellValue::Text(t) => format!("{:?}", t),
    }
}

/// Where a build writes: explicit flag, then the model's `output`, then the
/// model path with `.xlsm` for a macro template and `.xlsx` otherwise
fn resolve_output(file: &Path, output: Option<PathBuf>, model: &ProformaModel) -> PathBuf {
    output
        .or_else(|| model.output.clone())
        .unwrap_or_else(|| file.with_extension(default_extension(model)))
}

fn default_extension(model: &ProformaModel) -> &'static str {
    let macro_template = model
        .template
        .as_ref()
        .and_then(|t| t.extension())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsm"));
    if macro_template {
        "xlsm"
    } else {
        "xlsx"
    }
}

fn print_summary(summary: &ExportSummary) {
    for sheet in &summary.sheets {
        println!(
            "   📄 {:<28} {} facts, {} static cells",
            sheet.name.bright_blue().bold(),
            sheet.facts_written,
            sheet.static_cells
        );
    }
    println!();
}

/// Execute the build command
pub fn build(file: PathBuf, output: Option<PathBuf>, dry_run: bool, verbose: bool) -> ProformaResult<()> {
    println!("{}", "📊 Pro Forma - Building workbook".bold().green());
    println!("   Model: {}", file.display());

    if dry_run {
        println!(
            "{}",
            "📋 DRY RUN MODE - No workbook will be written\n".yellow()
        );
    }

    if verbose {
        println!("{}", "📖 Parsing model file...".cyan());
    }

    let model = parser::parse_model(&file)?;

    if verbose {
        let estimates = model.periods.iter().filter(|p| p.is_estimate()).count();
        println!(
            "   Found {} periods ({} actual, {} estimate), {} sheets, {} facts",
            model.periods.len(),
            model.periods.len() - estimates,
            estimates,
            model.sheets.len(),
            model.fact_count()
        );
        if let Some(name) = &model.company.name {
            println!("   Company: {}", name.bright_yellow());
        }
        if let Some(template) = &model.template {
            println!("   Template: {}", template.display());
        }
        println!();
    }

    let exporter = ExcelExporter::new(&model);

    if dry_run {
        let (_, summary) = exporter.build()?;
        print_summary(&summary);
        println!("{}", "📋 Dry run complete - no workbook written".yellow());
        return Ok(());
    }

    let output = resolve_output(&file, output, &model);
    if verbose {
        println!("{}", "🧮 Projecting facts onto sheets...".cyan());
    }

    let summary = exporter.export(&output)?;
    print_summary(&summary);

    println!("{}", "✅ Build Complete!".bold().green());
    println!("   Excel file: {}", output.display());
    println!(
        "   {} facts written across {} sheets",
        summary.facts_written(),
        summary.sheets.len()
    );
    if summary.macros {
        println!("   Template macros kept");
    }
    println!(
        "   {}",
        "Estimate cells are highlighted; formulas are evaluated when the workbook is opened"
            .dimmed()
    );

    Ok(())
}

#[derive(Serialize)]
struct DumpedCell<'a> {
    cell: String,
    value: &'a CellValue,
}

#[derive(Serialize)]
struct DumpedSheet<'a> {
    sheet: &'a str,
    cells: Vec<DumpedCell<'a>>,
}

/// Execute the dump command: print the cells of a written workbook
pub fn dump(file: PathBuf, sheet: Option<String>, json: bool) -> ProformaResult<()> {
    let names = match sheet {
        Some(name) => vec![name],
        None => sheet_names(&file)?,
    };

    let mut grids = Vec::with_capacity(names.len());
    for name in &names {
        grids.push(read_grid(&file, name)?);
    }

    if json {
        let dumped: Vec<DumpedSheet> = grids
            .iter()
            .map(|grid| DumpedSheet {
                sheet: &grid.sheet,
                cells: grid
                    .iter()
                    .map(|(cell, value)| DumpedCell {
                        cell: cell.to_string(),
                        value,
                    })
                    .collect(),
            })
            .collect();
        let text = serde_json::to_string_pretty(&dumped)
            .map_err(|e| crate::error::ProformaError::Parse(format!("JSON output: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", "🔍 Pro Forma - Workbook contents".bold().green());
    println!("   File: {}\n", file.display());

    for grid in &grids {
        println!("   📄 {} ({} cells)", grid.sheet.bright_blue().bold(), grid.len());
        for (cell, value) in grid.iter() {
            let kind = match value {
                CellValue::Formula(_) => value.type_name().bright_yellow(),
                _ => value.type_name().cyan(),
            };
            println!("      {:<7} {:<8} {}", cell.to_string(), kind, format_value(value));
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
