//! datasweep - Clean, trim and convert tabular files

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rustc_hash::FxHashSet;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use datasweep::config::{parse_overrides, Config, ExportFormat, FileControls, ReportFormat};
use datasweep::output::render_to_stdout;
use datasweep::pipeline::{BatchReport, Sweeper};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExportFormat {
    Csv,
    Xlsx,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(f: CliExportFormat) -> Self {
        match f {
            CliExportFormat::Csv => ExportFormat::Csv,
            CliExportFormat::Xlsx => ExportFormat::Xlsx,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportFormat {
    Terminal,
    Json,
    Html,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(f: CliReportFormat) -> Self {
        match f {
            CliReportFormat::Terminal => ReportFormat::Terminal,
            CliReportFormat::Json => ReportFormat::Json,
            CliReportFormat::Html => ReportFormat::Html,
        }
    }
}

/// Clean, trim and convert CSV and Excel files
#[derive(Parser, Debug)]
#[command(name = "datasweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to process (.csv or .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Enable data cleaning
    #[arg(long)]
    clean: bool,

    /// Remove duplicate rows
    #[arg(long, requires = "clean")]
    dedupe: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long, requires = "clean")]
    fill_missing: bool,

    /// Column(s) to keep, in order (comma-separated; default: all)
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Show a bar chart of the first two numeric columns
    #[arg(long)]
    chart: bool,

    /// Convert to this format and write the result
    #[arg(short, long, value_enum)]
    to: Option<CliExportFormat>,

    /// Directory for converted files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON file with per-file overrides, keyed by file name
    #[arg(long)]
    controls: Option<PathBuf>,

    /// Number of rows to preview
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliReportFormat,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(all_succeeded) => {
            if all_succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1) // At least one file failed
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set logger")?;

    let config = build_config(&cli)?;

    let sweeper = Sweeper::from_config(&config);
    let report = sweeper.run_paths(&config);

    write_exports(&report, &config)?;

    render_to_stdout(&report, config.report_format)?;

    Ok(report.all_succeeded())
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut defaults = FileControls::new();
    if cli.clean {
        defaults = defaults.with_cleaning(cli.dedupe, cli.fill_missing);
    }
    if let Some(ref columns) = cli.columns {
        // `--columns=` selects nothing
        let columns = columns.iter().filter(|c| !c.is_empty()).cloned().collect();
        defaults = defaults.with_columns(columns);
    }
    defaults = defaults.with_chart(cli.chart);
    if let Some(to) = cli.to {
        defaults = defaults.with_export(to.into());
    }

    let mut config = Config::new(cli.files.clone())
        .with_out_dir(cli.out_dir.clone())
        .with_defaults(defaults)
        .with_preview_rows(cli.preview_rows)
        .with_report_format(cli.format.into());

    if let Some(ref path) = cli.controls {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read controls file: {}", path.display()))?;
        let overrides = parse_overrides(&text)
            .with_context(|| format!("Invalid controls file: {}", path.display()))?;
        config = config.with_overrides(overrides);
    }

    Ok(config)
}

/// Save every export buffer into the output directory
fn write_exports(report: &BatchReport, config: &Config) -> Result<()> {
    let exports: Vec<_> = report.exports().collect();
    if exports.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&config.out_dir).with_context(|| {
        format!("Failed to create output directory: {}", config.out_dir.display())
    })?;

    let inputs: Vec<PathBuf> = config
        .inputs
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();

    let targets: Vec<PathBuf> = exports
        .iter()
        .map(|export| config.out_dir.join(&export.file_name))
        .collect();

    if let Some(target) = targets.iter().find(|t| is_input(t, &inputs)) {
        bail!(
            "Refusing to overwrite input file {}; choose another --out-dir",
            target.display()
        );
    }

    let mut seen = FxHashSet::default();
    if let Some(target) = targets.iter().find(|t| !seen.insert(*t)) {
        bail!(
            "Two inputs would both be written to {}; rename one of them",
            target.display()
        );
    }

    for (export, target) in exports.iter().zip(&targets) {
        fs::write(target, &export.bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!(path = %target.display(), mime = export.mime_type, "saved");
    }

    Ok(())
}

fn is_input(target: &Path, inputs: &[PathBuf]) -> bool {
    target
        .canonicalize()
        .map(|t| inputs.contains(&t))
        .unwrap_or(false)
}
