use thiserror::Error;

pub type ProformaResult<T> = Result<T, ProformaError>;

#[derive(Error, Debug)]
pub enum ProformaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Line item '{item}' has no row in the layout of sheet '{sheet}'")]
    UnknownLineItem { item: String, sheet: String },

    #[error("Period '{period}' is not mapped for sheet '{sheet}'")]
    UnknownPeriod { period: String, sheet: String },

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("Template mismatch: {0}")]
    TemplateMismatch(String),

    #[error("Invalid cell reference: {0}")]
    InvalidCellRef(String),

    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Excel read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Template workbook error: {0}")]
    Template(#[from] umya_spreadsheet::XlsxError),
}
