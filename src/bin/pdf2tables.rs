use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_table_extractor::{
    AlignmentPolicy, DetectionConfig, ExtractOptions, ExtractionReport, PageSelection,
    ValidationReport, extract_tables_from_pdf, tables_to_json, validate_tables, write_tables_csv,
    write_tables_json,
};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_NO_TABLES: u8 = 2;
const EXIT_INVALID_TABLES: u8 = 3;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2tables",
    version,
    about = "Recover tables from text PDFs using glyph positions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract tables, validate them and write CSV or JSON output.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlignmentArg {
    #[value(alias = "index-preserving")]
    Index,
    #[value(alias = "slide")]
    Positional,
}

impl From<AlignmentArg> for AlignmentPolicy {
    fn from(value: AlignmentArg) -> Self {
        match value {
            AlignmentArg::Index => Self::IndexPreserving,
            AlignmentArg::Positional => Self::Positional,
        }
    }
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for CSV, or file for JSON. JSON goes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Vertical rounding step that groups fragments into rows.
    #[arg(long, default_value_t = 5.0)]
    row_threshold: f32,

    /// Horizontal rounding step and jitter tolerance for columns.
    #[arg(long, default_value_t = 5.0)]
    column_threshold: f32,

    /// Gaps larger than row-threshold times this value split tables.
    #[arg(long, default_value_t = 3.0)]
    gap_multiplier: f32,

    /// An x position must occur more than this many times to be a column.
    #[arg(long, default_value_t = 2)]
    min_column_occurrences: usize,

    /// How grid rows line up with headers.
    #[arg(long, value_enum, default_value_t = AlignmentArg::Index)]
    alignment: AlignmentArg,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Fail when validation finds missing header values.
    #[arg(long)]
    strict: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(str::parse::<PageSelection>)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    Ok(ExtractOptions {
        pages,
        detection: DetectionConfig {
            row_threshold: args.row_threshold,
            column_threshold: args.column_threshold,
            region_gap_multiplier: args.gap_multiplier,
            min_column_occurrences: args.min_column_occurrences,
            ..DetectionConfig::default()
        },
        alignment: args.alignment.into(),
    })
}

fn log_report(report: &ExtractionReport, validation: &ValidationReport, verbose: bool) {
    eprintln!(
        "extracted {} table(s), {} row(s) from {} page(s)",
        report.table_count(),
        report.row_count(),
        report.page_count
    );

    if !report.warnings.is_empty() {
        eprintln!("warning: {} issue(s) detected", report.warnings.len());
        if verbose {
            for warning in &report.warnings {
                eprintln!(
                    "  - {:?} page={:?} region={:?} count={:?}: {}",
                    warning.code, warning.page, warning.region, warning.count, warning.message
                );
            }
        }
    }

    if !validation.issues.is_empty() {
        eprintln!("validation: {} issue(s)", validation.issues.len());
        if verbose || !validation.is_valid {
            for issue in &validation.issues {
                eprintln!("  - {issue}");
            }
        }
    }
}

fn write_output(args: &ExtractArgs, report: &ExtractionReport) -> Result<()> {
    match (args.format, args.output.as_deref()) {
        (OutputFormat::Json, Some(path)) => write_tables_json(path, &report.tables)
            .with_context(|| format!("failed to write '{}'", path.display())),
        (OutputFormat::Json, None) => {
            println!("{}", tables_to_json(&report.tables)?);
            Ok(())
        }
        (OutputFormat::Csv, output) => {
            if !args.delimiter.is_ascii() {
                anyhow::bail!("delimiter must be a single ASCII character");
            }
            let dir = output.unwrap_or_else(|| Path::new("."));
            let written = write_tables_csv(dir, &report.tables, args.delimiter as u8)
                .with_context(|| format!("failed to write CSV files to '{}'", dir.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<u8> {
    let options = parse_options(args)?;
    let report = extract_tables_from_pdf(&args.input, &options)
        .with_context(|| format!("failed to extract tables from '{}'", args.input.display()))?;

    let validation = validate_tables(&report.tables);
    log_report(&report, &validation, args.verbose);

    if report.is_empty() {
        eprintln!("no tables found in '{}'", args.input.display());
        return Ok(EXIT_NO_TABLES);
    }
    if args.strict && !validation.is_valid {
        return Ok(EXIT_INVALID_TABLES);
    }

    write_output(args, &report)?;
    Ok(0)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_table_extractor=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(code) => ExitCode::from(code),
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}
