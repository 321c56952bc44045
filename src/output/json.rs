//! JSON output format

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::model::{CellValue, Table};
use crate::pipeline::{BatchReport, ChartData, CleanSummary, ExportBuffer, FileOutcome, FileRun};

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    all_succeeded: bool,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum JsonFile<'a> {
    Ok(JsonRun<'a>),
    Error {
        name: &'a str,
        kind: &'static str,
        message: String,
    },
}

#[derive(Serialize)]
struct JsonRun<'a> {
    name: &'a str,
    ingested_rows: usize,
    rows: usize,
    columns: Vec<String>,
    preview: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clean: Option<&'a CleanSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a ChartData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<JsonExport<'a>>,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(flatten)]
    buffer: &'a ExportBuffer,
    size: usize,
}

fn cell_value_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::String(s) => serde_json::Value::String(s.to_string()),
        CellValue::Date(d) => serde_json::Value::String(d.to_string()),
        CellValue::DateTime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

fn rows_to_json(table: &Table) -> Vec<serde_json::Map<String, serde_json::Value>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(&row.cells)
                .map(|(col, cell)| (col.name.clone(), cell_value_to_json(cell)))
                .collect()
        })
        .collect()
}

fn run_to_json(run: &FileRun) -> JsonRun<'_> {
    JsonRun {
        name: &run.name,
        ingested_rows: run.ingested_rows,
        rows: run.table.row_count(),
        columns: run.table.column_names(),
        preview: rows_to_json(&run.preview),
        clean: run.clean.as_ref(),
        chart: run.chart.as_ref(),
        export: run.export.as_ref().map(|buffer| JsonExport {
            buffer,
            size: buffer.len(),
        }),
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        let files = report
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                FileOutcome::Succeeded(run) => JsonFile::Ok(run_to_json(run)),
                FileOutcome::Failed { name, error } => JsonFile::Error {
                    name,
                    kind: error.kind(),
                    message: error.to_string(),
                },
            })
            .collect();

        let output = JsonReport {
            all_succeeded: report.all_succeeded(),
            files,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}
