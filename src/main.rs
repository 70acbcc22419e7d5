use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use equipstate_tools::sync::{self, SyncOutcome};
use equipstate_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

/// Exit status for conversions blocked by validation findings; the BSD
/// sysexits data-format error, distinguishable from the generic failure 1.
const VALIDATION_FAILED: i32 = 65;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Convert(args) => execute_convert(args),
    }
}

fn execute_convert(args: ConvertArgs) -> Result<i32> {
    if !args.input.exists() {
        return Err(ToolError::MissingInput(args.input));
    }

    let outcome = match (args.from, args.to) {
        (DataFormat::Xml, DataFormat::Csv) => sync::xml_to_csv(&args.input, &args.output)?,
        (DataFormat::Xml, DataFormat::Xlsx) => sync::xml_to_excel(&args.input, &args.output)?,
        (DataFormat::Csv, DataFormat::Xml) => sync::csv_to_xml(&args.input, &args.output)?,
        (DataFormat::Xlsx, DataFormat::Xml) => sync::excel_to_xml(&args.input, &args.output)?,
        (DataFormat::Csv, DataFormat::Xlsx) => sync::csv_to_excel(&args.input, &args.output)?,
        (DataFormat::Xlsx, DataFormat::Csv) => sync::excel_to_csv(&args.input, &args.output)?,
        _ => {
            return Err(ToolError::UnsupportedConversion {
                from: args.from.to_string(),
                to: args.to.to_string(),
            });
        }
    };

    Ok(match outcome {
        SyncOutcome::Written { .. } => 0,
        SyncOutcome::Rejected {
            annotated,
            findings,
        } => {
            eprintln!(
                "validation failed ({} finding{}); annotated table written to {}",
                findings.len(),
                if findings.len() == 1 { "" } else { "s" },
                annotated.display()
            );
            VALIDATION_FAILED
        }
    })
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert equipment-state exports between markup and tabular forms."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one representation of a state export into another.
    Convert(ConvertArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Source representation.
    #[arg(long, value_enum)]
    from: DataFormat,

    /// Input file path.
    #[arg(long)]
    input: PathBuf,

    /// Target representation.
    #[arg(long, value_enum)]
    to: DataFormat,

    /// Output file path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DataFormat {
    Xml,
    Csv,
    Xlsx,
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Xml => write!(f, "xml"),
            DataFormat::Csv => write!(f, "csv"),
            DataFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}
