use std::path::PathBuf;

use aideon_consolidator::io::excel_write;
use aideon_consolidator::session::Session;
use aideon_consolidator::strategy::{ColumnSelection, Strategy};
use aideon_consolidator::{ConsolidateError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ConsolidateError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Consolidate(args) => execute_consolidate(args),
    }
}

fn execute_consolidate(args: ConsolidateArgs) -> Result<()> {
    let strategy = args.resolve_strategy()?;

    let mut session = Session::new();
    for path in &args.inputs {
        session.add_path(path)?;
    }

    if let Err(error) = session.run(&strategy) {
        print_report(&session, args.summary)?;
        return Err(error);
    }

    let written = match &args.output {
        Some(path) => {
            let result = session.result().ok_or(ConsolidateError::NoResult)?;
            excel_write::write_result(path, result)?;
            path.clone()
        }
        None => session.download(&args.output_dir)?,
    };

    print_report(&session, args.summary)?;
    println!("wrote {}", written.display());
    Ok(())
}

fn print_report(session: &Session, format: SummaryFormat) -> Result<()> {
    let report = session.report();
    match format {
        SummaryFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SummaryFormat::Text => {
            for entry in report.files {
                let rows = entry
                    .row_count
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<10} {:>8} rows  {}", entry.state, rows, entry.name());
            }
            if let Some(summary) = report.summary {
                println!(
                    "{} rows from {} files",
                    summary.total_rows, summary.total_files
                );
            }
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge the rows of many spreadsheet files into one workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consolidate every sheet of the given files into a single sheet.
    Consolidate(ConsolidateArgs),
}

#[derive(clap::Args)]
struct ConsolidateArgs {
    /// Input files (xlsx, xlsm, xlsb, xls, ods, csv, tsv), processed in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// How rows are combined.
    #[arg(long, value_enum, default_value_t = StrategyArg::FixedColumns)]
    strategy: StrategyArg,

    /// Columns kept by fixed-column extraction, e.g. `C,D,H:O`.
    #[arg(long)]
    columns: Option<String>,

    /// Output labels for the kept columns, one per column.
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Directory receiving the timestamped output workbook.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Explicit output path; overrides `--output-dir`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// How the per-file status report is printed.
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    summary: SummaryFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    FixedColumns,
    Positional,
    HeaderUnion,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
}

impl ConsolidateArgs {
    fn resolve_strategy(&self) -> Result<Strategy> {
        let labels = (!self.labels.is_empty()).then(|| self.labels.clone());

        match self.strategy {
            StrategyArg::FixedColumns => {
                let selection = match (&self.columns, labels) {
                    (Some(spec), labels) => ColumnSelection::parse(spec, labels)?,
                    (None, Some(labels)) => {
                        let positions = ColumnSelection::default().positions().to_vec();
                        ColumnSelection::new(positions, labels)?
                    }
                    (None, None) => ColumnSelection::default(),
                };
                Ok(Strategy::FixedColumns(selection))
            }
            other => {
                if self.columns.is_some() || labels.is_some() {
                    warn!("--columns and --labels only apply to fixed-columns");
                }
                Ok(match other {
                    StrategyArg::HeaderUnion => Strategy::HeaderUnion,
                    _ => Strategy::Positional,
                })
            }
        }
    }
}
