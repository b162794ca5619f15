use crate::layout::{CellRef, SheetLayout};
use crate::style::NumberFormat;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

//==============================================================================
// Periods
//==============================================================================

/// Whether a fiscal period is reported history or a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Historical, reported period
    Actual,
    /// Projected or consensus-forecast period
    Estimate,
}

impl PeriodKind {
    /// Infer the kind from a fiscal-year label: a trailing `E` marks an estimate
    /// (`FY 2026E`, `FY2025E`), anything else is an actual.
    pub fn infer(label: &str) -> Self {
        if label.trim_end().ends_with('E') {
            PeriodKind::Estimate
        } else {
            PeriodKind::Actual
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Actual => "actual",
            PeriodKind::Estimate => "estimate",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fiscal period column (e.g. `FY 2023`, `FY 2026E`)
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub label: String,
    pub kind: PeriodKind,
    /// Fiscal year end, written to the layout's date row when present
    pub end_date: Option<NaiveDate>,
}

impl Period {
    pub fn new(label: impl Into<String>, kind: PeriodKind) -> Self {
        Self {
            label: label.into(),
            kind,
            end_date: None,
        }
    }

    /// Build a period whose kind is inferred from its label
    pub fn inferred(label: impl Into<String>) -> Self {
        let label = label.into();
        let kind = PeriodKind::infer(&label);
        Self::new(label, kind)
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_estimate(&self) -> bool {
        self.kind == PeriodKind::Estimate
    }
}

//==============================================================================
// Cell values
//==============================================================================

/// A literal destined for one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    /// Formula text in the destination syntax, always with a leading `=`.
    /// Written verbatim, never evaluated here.
    Formula(String),
    Text(String),
}

impl CellValue {
    /// Build a formula, adding the leading `=` if missing
    pub fn formula(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        if expression.starts_with('=') {
            CellValue::Formula(expression)
        } else {
            CellValue::Formula(format!("={expression}"))
        }
    }

    /// Classify a string literal: `=...` is a formula, anything else is text
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with('=') && text.len() > 1 {
            CellValue::Formula(text)
        } else {
            CellValue::Text(text)
        }
    }

    /// Numbers and formulas carry numeric display formats; text does not
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Number(_) | CellValue::Formula(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "Number",
            CellValue::Formula(_) => "Formula",
            CellValue::Text(_) => "Text",
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::from_text(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Formula(s) | CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Formula(s) | CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

//==============================================================================
// Fact tables
//==============================================================================

/// One line item with its values keyed by period label, in declared order
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub item: String,
    pub values: Vec<(String, CellValue)>,
}

/// Literal facts keyed by (line item, period)
///
/// Insertion order is kept so projection plans are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactTable {
    rows: Vec<FactRow>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for (item, period), replacing any previous value
    pub fn insert(
        &mut self,
        item: impl Into<String>,
        period: impl Into<String>,
        value: impl Into<CellValue>,
    ) {
        let item = item.into();
        let period = period.into();
        let value = value.into();

        let idx = match self.rows.iter().position(|r| r.item == item) {
            Some(idx) => idx,
            None => {
                self.rows.push(FactRow {
                    item,
                    values: Vec::new(),
                });
                self.rows.len() - 1
            }
        };

        let row = &mut self.rows[idx];
        match row.values.iter_mut().find(|(p, _)| *p == period) {
            Some(slot) => slot.1 = value,
            None => row.values.push((period, value)),
        }
    }

    pub fn get(&self, item: &str, period: &str) -> Option<&CellValue> {
        self.rows
            .iter()
            .find(|r| r.item == item)?
            .values
            .iter()
            .find(|(p, _)| p == period)
            .map(|(_, v)| v)
    }

    pub fn rows(&self) -> &[FactRow] {
        &self.rows
    }

    /// All (item, period, value) triples, line items outer, periods inner
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &CellValue)> {
        self.rows.iter().flat_map(|row| {
            row.values
                .iter()
                .map(move |(period, value)| (row.item.as_str(), period.as_str(), value))
        })
    }

    /// Number of (item, period) facts
    pub fn len(&self) -> usize {
        self.rows.iter().map(|r| r.values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//==============================================================================
// Styles
//==============================================================================

/// Display formats and highlight fills
#[derive(Debug, Clone, PartialEq)]
pub struct Styles {
    pub currency_format: String,
    pub percent_format: String,
    pub date_format: String,
    /// RGB fill for actual periods
    pub actual_fill: u32,
    /// RGB fill for estimate periods
    pub estimate_fill: u32,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            currency_format: "#,##0.0".to_string(),
            percent_format: "0.0%".to_string(),
            date_format: "m/d/yyyy".to_string(),
            actual_fill: 0xDDEBF7,
            estimate_fill: 0xFFFFCC,
        }
    }
}

//==============================================================================
// Model
//==============================================================================

/// Company the model describes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Company {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
}

/// One destination sheet: where things go, what goes there
#[derive(Debug, Clone)]
pub struct SheetSpec {
    pub name: String,
    pub layout: SheetLayout,
    pub facts: FactTable,
    /// Literal cells written verbatim (banners, titles, assumption blocks)
    pub cells: BTreeMap<CellRef, CellValue>,
}

impl SheetSpec {
    pub fn new(name: impl Into<String>, layout: SheetLayout) -> Self {
        Self {
            name: name.into(),
            layout,
            facts: FactTable::new(),
            cells: BTreeMap::new(),
        }
    }
}

/// A parsed model file
#[derive(Debug, Clone, Default)]
pub struct ProformaModel {
    pub company: Company,
    pub periods: Vec<Period>,
    pub styles: Styles,
    pub sheets: Vec<SheetSpec>,
    /// Workbook to seed from, resolved against the model file directory
    pub template: Option<PathBuf>,
    /// Default output path, resolved against the model file directory
    pub output: Option<PathBuf>,
}

impl ProformaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period(&self, label: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.label == label)
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSpec> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Total facts across all sheets
    pub fn fact_count(&self) -> usize {
        self.sheets.iter().map(|s| s.facts.len()).sum()
    }
}

//==============================================================================
// Cell writes
//==============================================================================

/// The atomic projection step: one value to one cell, with its styling
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub sheet: String,
    pub cell: CellRef,
    pub value: CellValue,
    pub number_format: NumberFormat,
    pub fill: PeriodKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_kind_inferred_from_suffix() {
        assert_eq!(PeriodKind::infer("FY 2026E"), PeriodKind::Estimate);
        assert_eq!(PeriodKind::infer("FY2025E"), PeriodKind::Estimate);
        assert_eq!(PeriodKind::infer("FY 2025"), PeriodKind::Actual);
        assert_eq!(PeriodKind::infer("FY2024A"), PeriodKind::Actual);
    }

    #[test]
    fn test_cell_value_from_text() {
        assert_eq!(
            CellValue::from_text("=B6*(1-0.566)"),
            CellValue::Formula("=B6*(1-0.566)".to_string())
        );
        assert_eq!(CellValue::from_text("N/A"), CellValue::Text("N/A".to_string()));
        assert_eq!(CellValue::from_text("="), CellValue::Text("=".to_string()));
    }

    #[test]
    fn test_cell_value_formula_adds_equals() {
        assert_eq!(
            CellValue::formula("G5-G6"),
            CellValue::Formula("=G5-G6".to_string())
        );
        assert_eq!(
            CellValue::formula("=G5-G6"),
            CellValue::Formula("=G5-G6".to_string())
        );
    }

    #[test]
    fn test_fact_table_keeps_order_and_overrides() {
        let mut facts = FactTable::new();
        facts.insert("Revenue", "FY 2023", 8110.518);
        facts.insert("Cost Of Goods Sold", "FY 2023", 3618.178);
        facts.insert("Revenue", "FY 2024", 9619.278);
        facts.insert("Revenue", "FY 2023", 8110.0);

        assert_eq!(facts.len(), 3);
        let triples: Vec<_> = facts.iter().map(|(i, p, _)| (i, p)).collect();
        assert_eq!(
            triples,
            vec![
                ("Revenue", "FY 2023"),
                ("Revenue", "FY 2024"),
                ("Cost Of Goods Sold", "FY 2023"),
            ]
        );
        assert_eq!(
            facts.get("Revenue", "FY 2023"),
            Some(&CellValue::Number(8110.0))
        );
        assert_eq!(facts.get("Revenue", "FY 2027E"), None);
    }

    #[test]
    fn test_cell_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            CellValue::Number(1.5),
            CellValue::formula("A1+1"),
            CellValue::Text("x".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[1.5,"=A1+1","x"]"#);
    }
}
