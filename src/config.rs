//! Configuration handling for datasweep

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Target format for converted files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Canonical file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Human label, as shown next to the download
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Output format for the batch report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
    Html,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

/// The control state for one file: what to clean, keep, show and export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileControls {
    /// Master switch for the cleaning operations
    pub clean: bool,
    /// Remove exact duplicate rows (only when `clean` is set)
    pub dedupe: bool,
    /// Fill missing numeric cells with the column mean (only when `clean` is set)
    pub fill_missing: bool,
    /// Columns to keep, in order. `None` keeps every column.
    pub columns: Option<Vec<String>>,
    /// Build the bar chart
    pub show_chart: bool,
    pub export_format: ExportFormat,
    /// Produce an export buffer
    pub convert: bool,
}

impl FileControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable cleaning with the given operations
    pub fn with_cleaning(mut self, dedupe: bool, fill_missing: bool) -> Self {
        self.clean = true;
        self.dedupe = dedupe;
        self.fill_missing = fill_missing;
        self
    }

    /// Keep only these columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_chart(mut self, show: bool) -> Self {
        self.show_chart = show;
        self
    }

    /// Convert to the given format
    pub fn with_export(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self.convert = true;
        self
    }

    /// Overlay the fields a patch sets
    pub fn apply(&mut self, patch: &FileControlsPatch) {
        if let Some(clean) = patch.clean {
            self.clean = clean;
        }
        if let Some(dedupe) = patch.dedupe {
            self.dedupe = dedupe;
        }
        if let Some(fill) = patch.fill_missing {
            self.fill_missing = fill;
        }
        if let Some(ref columns) = patch.columns {
            self.columns = Some(columns.clone());
        }
        if let Some(chart) = patch.chart {
            self.show_chart = chart;
        }
        if let Some(format) = patch.to {
            self.export_format = format;
            self.convert = true;
        }
        if let Some(convert) = patch.convert {
            self.convert = convert;
        }
    }
}

/// Per-file overrides read from a controls document. Unset fields keep
/// the command-line defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileControlsPatch {
    pub clean: Option<bool>,
    pub dedupe: Option<bool>,
    pub fill_missing: Option<bool>,
    pub columns: Option<Vec<String>>,
    pub chart: Option<bool>,
    /// Setting a target format also turns conversion on
    pub to: Option<ExportFormat>,
    pub convert: Option<bool>,
}

/// Parse a controls document: a JSON object keyed by file name
pub fn parse_overrides(json: &str) -> serde_json::Result<IndexMap<String, FileControlsPatch>> {
    serde_json::from_str(json)
}

/// Configuration for a sweep run
#[derive(Debug, Clone)]
pub struct Config {
    /// Files to process, in order
    pub inputs: Vec<PathBuf>,
    /// Directory converted files are written to
    pub out_dir: PathBuf,
    /// Controls applied to every file
    pub defaults: FileControls,
    /// Per-file overrides, keyed by file name
    pub overrides: IndexMap<String, FileControlsPatch>,
    /// Rows shown in the preview
    pub preview_rows: usize,
    /// Report format
    pub report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: PathBuf::from("."),
            defaults: FileControls::default(),
            overrides: IndexMap::new(),
            preview_rows: 5,
            report_format: ReportFormat::default(),
        }
    }
}

impl Config {
    /// Create a new Config over the given inputs
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            ..Default::default()
        }
    }

    /// Set the output directory
    pub fn with_out_dir(mut self, dir: PathBuf) -> Self {
        self.out_dir = dir;
        self
    }

    /// Set the controls every file starts from
    pub fn with_defaults(mut self, controls: FileControls) -> Self {
        self.defaults = controls;
        self
    }

    /// Set per-file overrides
    pub fn with_overrides(mut self, overrides: IndexMap<String, FileControlsPatch>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the number of preview rows
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Set report format
    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }

    /// Resolve the controls for one file: defaults plus its override, if any
    pub fn controls_for(&self, file_name: &str) -> FileControls {
        let mut controls = self.defaults.clone();
        if let Some(patch) = self.overrides.get(file_name) {
            controls.apply(patch);
        }
        controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_metadata() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
        assert_eq!(
            ExportFormat::Xlsx.mime_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!("Excel".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_controls_for_applies_override() {
        let overrides = parse_overrides(
            r#"{"a.csv": {"clean": true, "dedupe": true, "columns": ["id"], "to": "xlsx"}}"#,
        )
        .unwrap();
        let config = Config::new(vec![])
            .with_defaults(FileControls::new().with_chart(true))
            .with_overrides(overrides);

        let a = config.controls_for("a.csv");
        assert!(a.clean && a.dedupe && !a.fill_missing);
        assert!(a.show_chart);
        assert_eq!(a.columns, Some(vec!["id".to_string()]));
        assert_eq!(a.export_format, ExportFormat::Xlsx);
        assert!(a.convert);

        let b = config.controls_for("b.csv");
        assert_eq!(b, FileControls::new().with_chart(true));
    }

    #[test]
    fn test_overrides_reject_unknown_fields() {
        assert!(parse_overrides(r#"{"a.csv": {"dedup": true}}"#).is_err());
    }
}
