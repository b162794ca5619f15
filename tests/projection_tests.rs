//! Projection tests: model → workbook → read-back
//!
//! Exercises the full build on the Lululemon Module 7 model and checks the
//! written grid through calamine.

use pretty_assertions::assert_eq;
use royalbit_proforma::core::GridProjector;
use royalbit_proforma::excel::{read_grid, sheet_names, ExcelExporter};
use royalbit_proforma::layout::{CellRef, SheetLayout};
use royalbit_proforma::parser::parse_model;
use royalbit_proforma::style::NumberFormat;
use royalbit_proforma::types::Styles;
use royalbit_proforma::{CellValue, FactTable, Period, PeriodKind, ProformaError};
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/lululemon_module7.yaml")
}

fn bloomberg_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/lululemon_bloomberg.yaml")
}

fn number(n: f64) -> CellValue {
    CellValue::Number(n)
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL MODEL BUILD
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_lululemon_model_parses() {
    let model = parse_model(&fixture()).unwrap();

    assert_eq!(model.company.ticker.as_deref(), Some("LULU"));
    assert_eq!(model.periods.len(), 8);
    assert_eq!(
        model.periods.iter().filter(|p| p.is_estimate()).count(),
        2
    );
    assert_eq!(model.sheets.len(), 2);
    assert_eq!(model.sheet("IncomeStatement").unwrap().facts.len(), 175);
}

#[test]
fn test_lululemon_build_writes_both_statements() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("lulu.xlsx");
    let model = parse_model(&fixture()).unwrap();

    let summary = ExcelExporter::new(&model).export(&output).unwrap();

    assert_eq!(summary.facts_written(), model.fact_count());
    assert!(summary.template_sheets.is_empty());
    assert_eq!(
        sheet_names(&output).unwrap(),
        vec!["IncomeStatement".to_string(), "BalanceSheet".to_string()]
    );
}

#[test]
fn test_fy2023_revenue_and_cogs_land_in_column_d() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("lulu.xlsx");
    let model = parse_model(&fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let grid = read_grid(&output, "IncomeStatement").unwrap();

    assert_eq!(grid.get_a1("D5").unwrap(), Some(&number(8110.518)));
    assert_eq!(grid.get_a1("D6").unwrap(), Some(&number(3618.178)));
    assert_eq!(grid.get_a1("D3").unwrap(), Some(&text("FY 2023")));
}

#[test]
fn test_projection_formulas_written_verbatim() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("lulu.xlsx");
    let model = parse_model(&fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let income = read_grid(&output, "IncomeStatement").unwrap();
    assert_eq!(
        income.get_a1("G6").unwrap(),
        Some(&CellValue::formula("G5*(1-$B$34)"))
    );
    assert_eq!(
        income.get_a1("H20").unwrap(),
        Some(&CellValue::formula("H19*$C$36"))
    );

    let balance = read_grid(&output, "BalanceSheet").unwrap();
    assert_eq!(
        balance.get_a1("H6").unwrap(),
        Some(&CellValue::formula("IncomeStatement!G5*$B$47"))
    );
}

#[test]
fn test_static_cells_labels_and_dates() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("lulu.xlsx");
    let model = parse_model(&fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let grid = read_grid(&output, "IncomeStatement").unwrap();

    assert_eq!(grid.get_a1("A1").unwrap(), Some(&text("Ticker")));
    assert_eq!(grid.get_a1("B1").unwrap(), Some(&text("LULU")));
    assert_eq!(grid.get_a1("B34").unwrap(), Some(&number(0.5654)));
    assert_eq!(grid.get_a1("A7").unwrap(), Some(&text("  Gross Profit")));
    assert_eq!(grid.get_a1("A5").unwrap(), Some(&text("Revenue")));
    // 2023-01-29 as an Excel serial date
    assert_eq!(grid.get_a1("D4").unwrap(), Some(&number(44955.0)));
}

#[test]
fn test_untouched_cells_stay_empty() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("lulu.xlsx");
    let model = parse_model(&fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let grid = read_grid(&output, "IncomeStatement").unwrap();

    // Row 26 is the spacer between NI to Common and the share counts
    assert_eq!(grid.get_a1("D26").unwrap(), None);
    assert_eq!(grid.get_a1("I5").unwrap(), None);
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.xlsx");
    let second = dir.path().join("second.xlsx");
    let model = parse_model(&fixture()).unwrap();

    ExcelExporter::new(&model).export(&first).unwrap();
    ExcelExporter::new(&model).export(&second).unwrap();

    for sheet in ["IncomeStatement", "BalanceSheet"] {
        let a = read_grid(&first, sheet).unwrap();
        let b = read_grid(&second, sheet).unwrap();
        assert_eq!(a, b, "sheet {} differs between builds", sheet);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// THREE-STATEMENT MODEL (MULTI-WORD SHEET NAMES)
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_bloomberg_model_keeps_sheet_names() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("bloomberg.xlsx");
    let model = parse_model(&bloomberg_fixture()).unwrap();

    let summary = ExcelExporter::new(&model).export(&output).unwrap();

    assert_eq!(summary.facts_written(), 165);
    assert_eq!(
        sheet_names(&output).unwrap(),
        vec![
            "Income Statement".to_string(),
            "Balance Sheet".to_string(),
            "Cash Flow Statement".to_string(),
            "Assumptions & Sources".to_string(),
        ]
    );

    let assumptions = read_grid(&output, "Assumptions & Sources").unwrap();
    assert_eq!(assumptions.get_a1("B5").unwrap(), Some(&number(0.592)));
    assert_eq!(
        assumptions.get_a1("B11").unwrap(),
        Some(&text("Bloomberg Macro XIDF (1).xlsm"))
    );
}

#[test]
fn test_quoted_cross_sheet_formulas_written_verbatim() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("bloomberg.xlsx");
    let model = parse_model(&bloomberg_fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let cash_flow = read_grid(&output, "Cash Flow Statement").unwrap();
    assert_eq!(
        cash_flow.get_a1("E6").unwrap(),
        Some(&CellValue::Formula("='Income Statement'!E18".to_string()))
    );
    assert_eq!(
        cash_flow.get_a1("B13").unwrap(),
        Some(&CellValue::Formula("='Balance Sheet'!B6".to_string()))
    );
    assert_eq!(
        cash_flow.get_a1("G11").unwrap(),
        Some(&CellValue::Formula(
            "=-'Income Statement'!G6*'Assumptions & Sources'!B9".to_string()
        ))
    );

    let income = read_grid(&output, "Income Statement").unwrap();
    assert_eq!(
        income.get_a1("E7").unwrap(),
        Some(&CellValue::Formula(
            "=E6*(1-'Assumptions & Sources'!B5)".to_string()
        ))
    );

    let balance = read_grid(&output, "Balance Sheet").unwrap();
    assert_eq!(
        balance.get_a1("F14").unwrap(),
        Some(&CellValue::Formula("=E14+'Income Statement'!F18".to_string()))
    );

    let assumptions = read_grid(&output, "Assumptions & Sources").unwrap();
    assert_eq!(
        assumptions.get_a1("B15").unwrap(),
        Some(&CellValue::Formula("='Income Statement'!D13".to_string()))
    );
}

#[test]
fn test_configured_fills_reach_the_workbook() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("bloomberg.xlsx");
    let model = parse_model(&bloomberg_fixture()).unwrap();
    ExcelExporter::new(&model).export(&output).unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    let income = book.get_sheet_by_name("Income Statement").unwrap();
    let fill = |cell: &str| {
        income
            .get_style(cell)
            .get_background_color()
            .map(|c| c.get_argb().to_string())
    };

    assert_eq!(fill("D6").as_deref(), Some("FFE2EFDA"));
    assert_eq!(fill("E6").as_deref(), Some("FFFFF2CC"));
    assert_eq!(
        income
            .get_style("E9")
            .get_number_format()
            .map(|f| f.get_format_code().to_string())
            .as_deref(),
        Some("0.0%")
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// PROJECTOR ON A HAND-BUILT LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

fn income_layout() -> SheetLayout {
    SheetLayout::new("IncomeStatement")
        .with_row("Revenue", 4)
        .with_row("Cost Of Goods Sold", 5)
        .with_row("Gross Margin", 6)
        .with_column("FY 2023", 3)
        .with_column("FY 2026E", 6)
}

fn periods() -> Vec<Period> {
    vec![Period::inferred("FY 2023"), Period::inferred("FY 2026E")]
}

#[test]
fn test_written_grid_matches_fact_table() {
    let styles = Styles::default();
    let periods = periods();
    let projector = GridProjector::new(&styles, &periods);
    let layout = income_layout();

    let mut facts = FactTable::new();
    facts.insert("Revenue", "FY 2023", 8110.518);
    facts.insert("Cost Of Goods Sold", "FY 2023", 3618.178);
    facts.insert("Revenue", "FY 2026E", 11040.29);
    facts.insert("Cost Of Goods Sold", "FY 2026E", "=G5*(1-$B$34)");

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("grid.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("IncomeStatement").unwrap();
    let written = projector.project(worksheet, &facts, &layout).unwrap();
    workbook.save(&output).unwrap();

    assert_eq!(written, 4);
    let grid = read_grid(&output, "IncomeStatement").unwrap();
    for (item, period, value) in facts.iter() {
        let cell = layout.cell_for(item, period).unwrap();
        assert_eq!(grid.get(cell), Some(value), "{} / {}", item, period);
    }
    assert_eq!(grid.len(), 4);
}

#[test]
fn test_unknown_line_item_fails_before_any_write() {
    let styles = Styles::default();
    let periods = periods();
    let projector = GridProjector::new(&styles, &periods);
    let layout = income_layout();

    let mut facts = FactTable::new();
    facts.insert("Revenue", "FY 2023", 8110.518);
    facts.insert("Operating Income", "FY 2023", 1328.6);

    let result = projector.plan("IncomeStatement", &facts, &layout);

    match result {
        Err(ProformaError::UnknownLineItem { item, sheet }) => {
            assert_eq!(item, "Operating Income");
            assert_eq!(sheet, "IncomeStatement");
        }
        other => panic!("expected UnknownLineItem, got {:?}", other),
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    assert!(projector.project(worksheet, &facts, &layout).is_err());

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("untouched.xlsx");
    worksheet.set_name("IncomeStatement").unwrap();
    workbook.save(&output).unwrap();
    assert!(read_grid(&output, "IncomeStatement").unwrap().is_empty());
}

#[test]
fn test_unknown_period_fails() {
    let styles = Styles::default();
    let periods = periods();
    let projector = GridProjector::new(&styles, &periods);

    let mut facts = FactTable::new();
    facts.insert("Revenue", "FY 2019", 3288.319);

    let result = projector.plan("IncomeStatement", &facts, &income_layout());
    assert!(matches!(result, Err(ProformaError::UnknownPeriod { .. })));
}

#[test]
fn test_fills_and_formats_per_cell() {
    let styles = Styles::default();
    let periods = periods();
    let projector = GridProjector::new(&styles, &periods);

    let mut facts = FactTable::new();
    facts.insert("Revenue", "FY 2023", 8110.518);
    facts.insert("Gross Margin", "FY 2023", 0.5539);
    facts.insert("Gross Margin", "FY 2026E", "=1-G6/G5");

    let writes = projector
        .plan("IncomeStatement", &facts, &income_layout())
        .unwrap();

    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].cell, CellRef::new(4, 3));
    assert_eq!(writes[0].number_format, NumberFormat::Currency);
    assert_eq!(writes[0].fill, PeriodKind::Actual);
    assert_eq!(writes[1].number_format, NumberFormat::Percent);
    assert_eq!(writes[2].number_format, NumberFormat::Percent);
    assert_eq!(writes[2].fill, PeriodKind::Estimate);

    // Every cell gets exactly one of the two fills, and they differ
    assert_ne!(
        styles.fill_for(PeriodKind::Actual),
        styles.fill_for(PeriodKind::Estimate)
    );
    assert_eq!(styles.fill_for(writes[2].fill), 0xFFFFCC);
}

#[test]
fn test_written_cells_carry_number_formats_and_fills() {
    let styles = Styles::default();
    let periods = periods();
    let projector = GridProjector::new(&styles, &periods);

    let mut facts = FactTable::new();
    facts.insert("Revenue", "FY 2023", 8110.518);
    facts.insert("Gross Margin", "FY 2023", 0.5539);
    facts.insert("Gross Margin", "FY 2026E", "=1-G6/G5");

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("styled.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("IncomeStatement").unwrap();
    projector.project(worksheet, &facts, &income_layout()).unwrap();
    workbook.save(&output).unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    let sheet = book.get_sheet_by_name("IncomeStatement").unwrap();
    let style_of = |cell: &str| {
        let style = sheet.get_style(cell);
        (
            style
                .get_number_format()
                .map(|f| f.get_format_code().to_string()),
            style.get_background_color().map(|c| c.get_argb().to_string()),
        )
    };

    assert_eq!(
        style_of("D5"),
        (Some("#,##0.0".to_string()), Some("FFDDEBF7".to_string()))
    );
    assert_eq!(
        style_of("D7"),
        (Some("0.0%".to_string()), Some("FFDDEBF7".to_string()))
    );
    assert_eq!(
        style_of("G7"),
        (Some("0.0%".to_string()), Some("FFFFFFCC".to_string()))
    );
}
