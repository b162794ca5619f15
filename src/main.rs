use anyhow::Context;
use clap::{Parser, Subcommand};
use royalbit_proforma::cli;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proforma")]
#[command(about = "Pro forma financial statements: YAML fact tables to Excel workbooks")]
#[command(long_about = "Pro Forma - Financial statement workbook builder

Projects literal fact tables (line item x fiscal period) onto fixed sheet
layouts and writes an Excel workbook. Historical figures and projection
formulas live in a YAML model file; formulas are written verbatim and
evaluated by the spreadsheet application when the file is opened.

COMMANDS:
  build  - Build a workbook from a model file
  dump   - Print the cells of a workbook

EXAMPLES:
  proforma build lululemon.yaml                 # Writes lululemon.xlsx
  proforma build lululemon.yaml -o Module7.xlsx
  proforma build lululemon.yaml --dry-run       # Check the model only
  proforma dump Module7.xlsx -s IncomeStatement

Set RUST_LOG=royalbit_proforma=debug for detailed logs.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Build a workbook from a model file.

Each sheet in the model gets its static cells, period headers, line item
labels and facts. Numbers get a thousands format, or a percentage format
when the line item mentions Margin, Growth or Rate. Actual and estimate
periods get distinct highlight fills.

A fact whose line item or period has no place in its sheet's layout is an
error; nothing is written.

TEMPLATES:
  template: Module7.xlsm
  Sheets and cell contents of the template are copied first, then the
  model's sheets are projected onto the same-named template sheets.

OUTPUT:
  --output, else the model's 'output:' key, else MODEL with .xlsx extension.")]
    /// Build a workbook from a model file
    Build {
        /// Path to YAML model file
        model: PathBuf,

        /// Output Excel file path (.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project in memory without writing the workbook
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show verbose build steps
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the cells of a workbook (formulas as written)
    Dump {
        /// Path to Excel file
        file: PathBuf,

        /// Only this sheet
        #[arg(short, long)]
        sheet: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Commands::Build { verbose: true, .. } => "royalbit_proforma=debug",
        _ => "royalbit_proforma=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            model,
            output,
            dry_run,
            verbose,
        } => cli::build(model.clone(), output, dry_run, verbose)
            .with_context(|| format!("failed to build workbook from {}", model.display())),

        Commands::Dump { file, sheet, json } => cli::dump(file.clone(), sheet, json)
            .with_context(|| format!("failed to read {}", file.display())),
    }
}
