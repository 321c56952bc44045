//! The file transform pipeline: ingest, clean, project, export
//!
//! Every call to [`Sweeper::handle`] runs the whole pipeline for one file
//! from its raw bytes. Nothing is cached between calls, so a changed control
//! simply means calling `handle` again.

mod chart;
mod upload;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::CodecRegistry;
use crate::config::{Config, ExportFormat, FileControls};
use crate::error::{Result, SweepError};
use crate::model::Table;
use crate::ops::{ImputeSummary, TabularOps};

pub use chart::{ChartData, Series, MAX_SERIES};
pub use upload::{output_file_name, ExportBuffer, UploadedFile};

/// What the clean stage did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    /// Rows removed, when deduplication ran
    pub duplicates_removed: Option<usize>,
    /// Imputation result, when it ran
    pub imputed: Option<ImputeSummary>,
}

/// Result of one successful pipeline run
#[derive(Debug, Clone)]
pub struct FileRun {
    pub name: String,
    /// First rows of the table as ingested
    pub preview: Table,
    /// Row count as ingested
    pub ingested_rows: usize,
    /// `None` when cleaning was off
    pub clean: Option<CleanSummary>,
    /// The cleaned, projected table
    pub table: Table,
    pub chart: Option<ChartData>,
    pub export: Option<ExportBuffer>,
}

/// Outcome of one file in a batch
#[derive(Debug)]
pub enum FileOutcome {
    Succeeded(FileRun),
    Failed { name: String, error: SweepError },
}

impl FileOutcome {
    pub fn name(&self) -> &str {
        match self {
            FileOutcome::Succeeded(run) => &run.name,
            FileOutcome::Failed { name, .. } => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Succeeded(_))
    }
}

/// Outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// True when no file halted
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Successful runs, in input order
    pub fn runs(&self) -> impl Iterator<Item = &FileRun> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Succeeded(run) => Some(run),
            FileOutcome::Failed { .. } => None,
        })
    }

    /// Export buffers produced by the batch
    pub fn exports(&self) -> impl Iterator<Item = &ExportBuffer> {
        self.runs().filter_map(|run| run.export.as_ref())
    }
}

/// Runs the pipeline for uploaded files
pub struct Sweeper {
    registry: CodecRegistry,
    preview_rows: usize,
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sweeper {
    pub fn new() -> Self {
        Self {
            registry: CodecRegistry::new(),
            preview_rows: 5,
        }
    }

    /// Set how many rows the preview keeps
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Build a sweeper from run configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_preview_rows(config.preview_rows)
    }

    /// Decode an upload, choosing the codec by extension
    pub fn ingest(&self, upload: &UploadedFile) -> Result<Table> {
        let table = self.registry.decode(&upload.name, &upload.bytes)?;
        debug!(
            file = %upload.name,
            rows = table.row_count(),
            columns = table.column_count(),
            "ingested"
        );
        Ok(table)
    }

    /// Encode a table in the target format, named after the upload
    pub fn export(&self, table: &Table, source_name: &str, format: ExportFormat) -> Result<ExportBuffer> {
        let bytes = self.registry.for_format(format).encode(table)?;
        let buffer = ExportBuffer::new(source_name, format, bytes);
        debug!(file = %buffer.file_name, bytes = buffer.len(), "exported");
        Ok(buffer)
    }

    /// Run every stage for one file with its controls
    pub fn handle(&self, upload: &UploadedFile, controls: &FileControls) -> Result<FileRun> {
        let mut table = self.ingest(upload)?;
        let preview = table.head(self.preview_rows);
        let ingested_rows = table.row_count();

        let clean = clean(&mut table, controls);

        let table = project(&table, controls)?;

        let chart = controls.show_chart.then(|| ChartData::from_table(&table));

        let export = if controls.convert {
            Some(self.export(&table, &upload.name, controls.export_format)?)
        } else {
            None
        };

        Ok(FileRun {
            name: upload.name.clone(),
            preview,
            ingested_rows,
            clean,
            table,
            chart,
            export,
        })
    }

    /// Run uploads one after another, each with the controls `config` gives it.
    /// A failing file is recorded and the rest still run.
    pub fn run_batch(&self, uploads: Vec<UploadedFile>, config: &Config) -> BatchReport {
        let outcomes = uploads
            .iter()
            .map(|upload| {
                let controls = config.controls_for(&upload.name);
                self.run_one(upload, &controls)
            })
            .collect();

        BatchReport { outcomes }
    }

    /// Read and run every input path in `config`
    pub fn run_paths(&self, config: &Config) -> BatchReport {
        let mut report = BatchReport::default();

        for path in &config.inputs {
            let outcome = match UploadedFile::from_path(path) {
                Ok(upload) => {
                    let controls = config.controls_for(&upload.name);
                    self.run_one(&upload, &controls)
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not read file");
                    FileOutcome::Failed {
                        name: path.display().to_string(),
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    fn run_one(&self, upload: &UploadedFile, controls: &FileControls) -> FileOutcome {
        info!(file = %upload.name, bytes = upload.bytes.len(), "processing");
        match self.handle(upload, controls) {
            Ok(run) => FileOutcome::Succeeded(run),
            Err(error) => {
                warn!(file = %upload.name, %error, "file skipped");
                FileOutcome::Failed {
                    name: upload.name.clone(),
                    error,
                }
            }
        }
    }
}

/// Apply the cleaning operations the controls enable: dedupe, then impute.
pub fn clean(table: &mut Table, controls: &FileControls) -> Option<CleanSummary> {
    if !controls.clean {
        return None;
    }

    let mut summary = CleanSummary::default();

    if controls.dedupe {
        let removed = table.deduplicate();
        debug!(removed, "duplicates removed");
        summary.duplicates_removed = Some(removed);
    }

    if controls.fill_missing {
        let imputed = table.fill_missing_with_mean();
        debug!(cells = imputed.filled_cells, "missing values filled");
        if !imputed.undefined_mean_columns.is_empty() {
            debug!(columns = ?imputed.undefined_mean_columns, "no mean, left unfilled");
        }
        summary.imputed = Some(imputed);
    }

    Some(summary)
}

/// Restrict to the selected columns; no selection keeps them all.
pub fn project(table: &Table, controls: &FileControls) -> Result<Table> {
    match controls.columns {
        Some(ref columns) => table.project(columns),
        None => Ok(table.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ExcelCodec, TabularCodec};
    use crate::model::CellValue;

    const SAMPLE: &str = "id,val\n1,\n1,5\n2,7\n";

    fn upload(name: &str, text: &str) -> UploadedFile {
        UploadedFile::new(name, text.as_bytes())
    }

    #[test]
    fn test_no_controls_passes_table_through() {
        let run = Sweeper::new()
            .handle(&upload("a.csv", SAMPLE), &FileControls::new())
            .unwrap();

        assert!(run.clean.is_none());
        assert!(run.chart.is_none());
        assert!(run.export.is_none());
        assert_eq!(run.table.column_names(), vec!["id", "val"]);
        assert_eq!(run.table.row_count(), 3);
    }

    #[test]
    fn test_dedupe_only_keeps_near_duplicates() {
        let controls = FileControls::new().with_cleaning(true, false);
        let run = Sweeper::new().handle(&upload("a.csv", SAMPLE), &controls).unwrap();

        assert_eq!(run.table.row_count(), 3);
        assert_eq!(run.clean.unwrap().duplicates_removed, Some(0));
    }

    #[test]
    fn test_fill_missing_only() {
        let controls = FileControls::new().with_cleaning(false, true);
        let run = Sweeper::new().handle(&upload("a.csv", SAMPLE), &controls).unwrap();

        assert_eq!(run.table.rows[0].cells[1], CellValue::Float(6.0));
        let clean = run.clean.unwrap();
        assert_eq!(clean.duplicates_removed, None);
        assert_eq!(clean.imputed.unwrap().filled_cells, 1);
    }

    #[test]
    fn test_cleaning_toggles_ignored_without_master_switch() {
        let mut controls = FileControls::new();
        controls.dedupe = true;
        controls.fill_missing = true;

        let run = Sweeper::new()
            .handle(&upload("d.csv", "a\n1\n1\n\n"), &controls)
            .unwrap();
        assert!(run.clean.is_none());
        assert_eq!(run.table.row_count(), run.ingested_rows);
    }

    #[test]
    fn test_dedupe_runs_before_impute() {
        // Imputing first would turn row 3 into a duplicate of row 1
        let controls = FileControls::new().with_cleaning(true, true);
        let run = Sweeper::new()
            .handle(&upload("o.csv", "k,v\na,2\na,2\na,\n"), &controls)
            .unwrap();

        assert_eq!(run.table.row_count(), 2);
        assert_eq!(run.table.rows[1].cells[1], CellValue::Float(2.0));
    }

    #[test]
    fn test_preview_is_taken_before_cleaning() {
        let controls = FileControls::new().with_cleaning(true, true);
        let run = Sweeper::new()
            .with_preview_rows(2)
            .handle(&upload("a.csv", SAMPLE), &controls)
            .unwrap();

        assert_eq!(run.preview.row_count(), 2);
        assert!(run.preview.rows[0].cells[1].is_null());
    }

    #[test]
    fn test_convert_to_xlsx() {
        let controls = FileControls::new().with_export(ExportFormat::Xlsx);
        let run = Sweeper::new().handle(&upload("a.csv", SAMPLE), &controls).unwrap();
        let export = run.export.unwrap();

        assert_eq!(export.file_name, "a.xlsx");
        assert_eq!(export.format, ExportFormat::Xlsx);

        let decoded = ExcelCodec.decode(&export.file_name, &export.bytes).unwrap();
        assert_eq!(decoded.column_names(), vec!["id", "val"]);
        assert_eq!(decoded.row_count(), 3);
    }

    #[test]
    fn test_chart_follows_projection() {
        let controls = FileControls::new()
            .with_columns(vec!["val".to_string()])
            .with_chart(true);
        let run = Sweeper::new().handle(&upload("a.csv", SAMPLE), &controls).unwrap();

        let chart = run.chart.unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "val");
    }

    #[test]
    fn test_unknown_column_fails_the_file() {
        let controls = FileControls::new().with_columns(vec!["nope".to_string()]);
        let err = Sweeper::new()
            .handle(&upload("a.csv", SAMPLE), &controls)
            .unwrap_err();
        assert!(matches!(err, SweepError::UnknownColumn { .. }));
    }

    #[test]
    fn test_batch_continues_after_failures() {
        let config = Config::default();
        let report = Sweeper::new().run_batch(
            vec![
                upload("notes.txt", "hello"),
                upload("bad.xlsx", "not a workbook"),
                upload("a.csv", SAMPLE),
            ],
            &config,
        );

        assert_eq!(report.outcomes.len(), 3);
        assert!(matches!(
            report.outcomes[0],
            FileOutcome::Failed { error: SweepError::UnsupportedFormat { .. }, .. }
        ));
        assert!(matches!(
            report.outcomes[1],
            FileOutcome::Failed { error: SweepError::Decode { .. }, .. }
        ));
        assert!(report.outcomes[2].is_success());
        assert_eq!(report.failure_count(), 2);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_batch_uses_per_file_controls() {
        let overrides = crate::config::parse_overrides(r#"{"b.csv": {"to": "xlsx"}}"#).unwrap();
        let config = Config::default()
            .with_defaults(FileControls::new().with_export(ExportFormat::Csv))
            .with_overrides(overrides);

        let report = Sweeper::from_config(&config).run_batch(
            vec![upload("a.csv", SAMPLE), upload("b.csv", SAMPLE)],
            &config,
        );

        assert!(report.all_succeeded());
        let names: Vec<&str> = report.exports().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.xlsx"]);
    }
}
