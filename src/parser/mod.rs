use crate::error::{ProformaError, ProformaResult};
use crate::layout::{column_letter_to_index, CellRef, RowSpec, SheetLayout};
use crate::style::parse_color;
use crate::types::{
    CellValue, Company, FactTable, Period, PeriodKind, ProformaModel, SheetSpec, Styles,
};
use chrono::NaiveDate;
use jsonschema::JSONSchema;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Longest worksheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

/// Parse a pro forma model file and return a resolved [`ProformaModel`].
///
/// The YAML document declares the fiscal periods, the sheet layouts (which row
/// each line item occupies, which column each period occupies), and the fact
/// tables to project onto them. Relative `template` and `output` paths are
/// resolved against the directory holding the model file.
///
/// Structural problems (unknown keys, bad cell references, layouts mapping
/// undeclared periods) are rejected here. Whether every fact has a place in
/// its layout is only known at projection time.
///
/// # Example
/// ```no_run
/// use royalbit_proforma::parser::parse_model;
/// use std::path::Path;
///
/// let model = parse_model(Path::new("lululemon.yaml"))?;
/// println!("Periods: {}", model.periods.len());
/// println!("Sheets: {}", model.sheets.len());
/// # Ok::<(), royalbit_proforma::error::ProformaError>(())
/// ```
pub fn parse_model(path: &Path) -> ProformaResult<ProformaModel> {
    let content = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_model_str(&content, base_dir)
}

/// Parse model YAML already in memory
pub fn parse_model_str(content: &str, base_dir: &Path) -> ProformaResult<ProformaModel> {
    let yaml: Value = serde_yaml::from_str(content)?;

    // Schema validation is advisory - warn and let serde report the real error
    if let Err(e) = validate_against_schema(&yaml) {
        warn!("{}", e);
    }

    let raw: RawModel = serde_yaml::from_value(yaml)?;
    build_model(raw, base_dir)
}

/// Check the document against `schema/proforma-model.schema.json`. Every
/// violation is reported on its own line.
fn validate_against_schema(yaml: &Value) -> ProformaResult<()> {
    let schema: serde_json::Value =
        serde_json::from_str(include_str!("../../schema/proforma-model.schema.json"))
            .map_err(|e| ProformaError::Validation(format!("model schema: {}", e)))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| ProformaError::Validation(format!("model schema: {}", e)))?;
    let document = serde_json::to_value(yaml)
        .map_err(|e| ProformaError::Validation(format!("model is not JSON-compatible: {}", e)))?;

    let violations: Vec<String> = match compiled.validate(&document) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{} at '{}'", e, e.instance_path))
            .collect(),
    };
    Err(ProformaError::Validation(format!(
        "model does not match schema: {}",
        violations.join("; ")
    )))
}

//==============================================================================
// Raw document shape
//==============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(rename = "_proforma_version")]
    #[allow(dead_code)]
    version: Option<String>,
    #[serde(default)]
    company: Company,
    template: Option<PathBuf>,
    output: Option<PathBuf>,
    #[serde(default)]
    styles: RawStyles,
    periods: Vec<RawPeriod>,
    #[serde(default)]
    layouts: HashMap<String, RawLayout>,
    sheets: Vec<RawSheet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyles {
    currency_format: Option<String>,
    percent_format: Option<String>,
    date_format: Option<String>,
    actual_fill: Option<String>,
    estimate_fill: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPeriod {
    label: String,
    kind: Option<PeriodKind>,
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRow {
    Row(u32),
    Labeled(RawLabeledRow),
}

/// `{ row: 7, label: "  Gross Profit" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLabeledRow {
    row: u32,
    label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawColumn {
    Number(u16),
    Letter(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayout {
    rows: HashMap<String, RawRow>,
    columns: HashMap<String, RawColumn>,
    header_row: Option<u32>,
    date_row: Option<u32>,
    label_column: Option<RawColumn>,
    label_width: Option<f64>,
    value_width: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLayoutRef {
    Named(String),
    Inline(RawLayout),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSheet {
    name: String,
    layout: RawLayoutRef,
    #[serde(default)]
    facts: Mapping,
    #[serde(default)]
    cells: Mapping,
}

//==============================================================================
// Resolution
//==============================================================================

fn build_model(raw: RawModel, base_dir: &Path) -> ProformaResult<ProformaModel> {
    let mut model = ProformaModel::new();
    model.company = raw.company;
    model.styles = build_styles(raw.styles)?;
    model.periods = build_periods(raw.periods)?;
    model.template = raw.template.map(|p| resolve_path(base_dir, p));
    model.output = raw.output.map(|p| resolve_path(base_dir, p));

    let mut sheet_names = HashSet::new();
    for raw_sheet in raw.sheets {
        let name = raw_sheet.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_SHEET_NAME {
            return Err(ProformaError::Validation(format!(
                "Sheet name '{}' must be 1-{} characters",
                raw_sheet.name, MAX_SHEET_NAME
            )));
        }
        if !sheet_names.insert(name.to_lowercase()) {
            return Err(ProformaError::Validation(format!(
                "Sheet '{}' is declared twice",
                name
            )));
        }

        let layout = match raw_sheet.layout {
            RawLayoutRef::Named(layout_name) => {
                let shared = raw.layouts.get(&layout_name).ok_or_else(|| {
                    ProformaError::Validation(format!(
                        "Sheet '{}' uses undefined layout '{}'",
                        name, layout_name
                    ))
                })?;
                build_layout(&name, shared.clone(), &model.periods)?
            }
            RawLayoutRef::Inline(inline) => build_layout(&name, inline, &model.periods)?,
        };

        let mut sheet = SheetSpec::new(name, layout);
        sheet.facts = build_facts(&sheet.name, &raw_sheet.facts)?;
        sheet.cells = build_cells(&sheet.name, &raw_sheet.cells)?;

        debug!(
            sheet = %sheet.name,
            facts = sheet.facts.len(),
            cells = sheet.cells.len(),
            "parsed sheet"
        );
        model.sheets.push(sheet);
    }

    Ok(model)
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn build_styles(raw: RawStyles) -> ProformaResult<Styles> {
    let mut styles = Styles::default();
    if let Some(f) = raw.currency_format {
        styles.currency_format = f;
    }
    if let Some(f) = raw.percent_format {
        styles.percent_format = f;
    }
    if let Some(f) = raw.date_format {
        styles.date_format = f;
    }
    if let Some(c) = raw.actual_fill {
        styles.actual_fill = color(&c)?;
    }
    if let Some(c) = raw.estimate_fill {
        styles.estimate_fill = color(&c)?;
    }
    if styles.actual_fill == styles.estimate_fill {
        return Err(ProformaError::Validation(
            "actual_fill and estimate_fill must differ".to_string(),
        ));
    }
    Ok(styles)
}

fn color(text: &str) -> ProformaResult<u32> {
    parse_color(text)
        .ok_or_else(|| ProformaError::Validation(format!("'{}' is not an RGB hex color", text)))
}

fn build_periods(raw: Vec<RawPeriod>) -> ProformaResult<Vec<Period>> {
    if raw.is_empty() {
        return Err(ProformaError::Validation(
            "At least one period is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut periods = Vec::with_capacity(raw.len());
    for p in raw {
        if !seen.insert(p.label.clone()) {
            return Err(ProformaError::Validation(format!(
                "Period '{}' is declared twice",
                p.label
            )));
        }
        let kind = p.kind.unwrap_or_else(|| PeriodKind::infer(&p.label));
        periods.push(Period {
            label: p.label,
            kind,
            end_date: p.end_date,
        });
    }
    Ok(periods)
}

fn build_layout(sheet: &str, raw: RawLayout, periods: &[Period]) -> ProformaResult<SheetLayout> {
    let mut layout = SheetLayout::new(sheet);

    for (item, spec) in raw.rows {
        let (row, label) = match spec {
            RawRow::Row(row) => (row, None),
            RawRow::Labeled(RawLabeledRow { row, label }) => (row, label),
        };
        let row = zero_based_row(sheet, row)?;
        layout.rows.insert(item, RowSpec { row, label });
    }

    for (period, column) in raw.columns {
        if !periods.iter().any(|p| p.label == period) {
            return Err(ProformaError::Validation(format!(
                "Layout of sheet '{}' maps undeclared period '{}'",
                sheet, period
            )));
        }
        layout.columns.insert(period, zero_based_column(&column)?);
    }

    layout.header_row = raw.header_row.map(|r| zero_based_row(sheet, r)).transpose()?;
    layout.date_row = raw.date_row.map(|r| zero_based_row(sheet, r)).transpose()?;
    layout.label_column = raw.label_column.as_ref().map(zero_based_column).transpose()?;
    layout.label_width = raw.label_width;
    layout.value_width = raw.value_width;

    let collisions = layout.collisions();
    if !collisions.is_empty() {
        let cells: Vec<String> = collisions.iter().map(|c| c.to_string()).collect();
        warn!(sheet, cells = %cells.join(", "), "layout maps several facts to the same cell");
    }

    Ok(layout)
}

fn zero_based_row(sheet: &str, row: u32) -> ProformaResult<u32> {
    if row == 0 {
        return Err(ProformaError::Validation(format!(
            "Layout of sheet '{}' uses row 0; rows start at 1",
            sheet
        )));
    }
    Ok(row - 1)
}

fn zero_based_column(column: &RawColumn) -> ProformaResult<u16> {
    match column {
        RawColumn::Letter(letters) => column_letter_to_index(letters.trim()),
        RawColumn::Number(0) => Err(ProformaError::InvalidCellRef(
            "column 0: columns start at 1".to_string(),
        )),
        RawColumn::Number(n) => Ok(n - 1),
    }
}

fn build_facts(sheet: &str, raw: &Mapping) -> ProformaResult<FactTable> {
    let mut facts = FactTable::new();

    for (item_key, periods) in raw {
        let item = key_string(item_key)?;
        let periods = periods.as_mapping().ok_or_else(|| {
            ProformaError::Parse(format!(
                "Sheet '{}', line item '{}': expected a mapping of period to value",
                sheet, item
            ))
        })?;

        for (period_key, value) in periods {
            let period = key_string(period_key)?;
            let value = cell_value(value).map_err(|msg| {
                ProformaError::Parse(format!(
                    "Sheet '{}', line item '{}', period '{}': {}",
                    sheet, item, period, msg
                ))
            })?;
            facts.insert(item.clone(), period, value);
        }
    }

    Ok(facts)
}

fn build_cells(sheet: &str, raw: &Mapping) -> ProformaResult<BTreeMap<CellRef, CellValue>> {
    let mut cells = BTreeMap::new();

    for (key, value) in raw {
        let address = key_string(key)?;
        let cell: CellRef = address.parse()?;
        let value = cell_value(value).map_err(|msg| {
            ProformaError::Parse(format!("Sheet '{}', cell {}: {}", sheet, address, msg))
        })?;
        cells.insert(cell, value);
    }

    Ok(cells)
}

fn key_string(key: &Value) -> ProformaResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ProformaError::Parse(format!(
            "Keys must be strings, found {:?}",
            other
        ))),
    }
}

fn cell_value(value: &Value) -> Result<CellValue, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .ok_or_else(|| format!("number {} is out of range", n)),
        Value::String(s) => Ok(CellValue::from_text(s.clone())),
        other => Err(format!("expected a number or string, found {:?}", other)),
    }
}
