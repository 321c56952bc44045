//! Colored terminal output

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::model::Table;
use crate::pipeline::{BatchReport, ChartData, CleanSummary, FileOutcome, FileRun};

use super::{OutputFormatter, CHART_ROW_LIMIT, SUCCESS_MESSAGE};

const BAR_WIDTH: usize = 40;
const SERIES_COLORS: [Color; 2] = [Color::Cyan, Color::Yellow];

/// Terminal output with colors
pub struct TerminalOutput {
    bar_width: usize,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            bar_width: BAR_WIDTH,
        }
    }

    pub fn with_bar_width(bar_width: usize) -> Self {
        Self { bar_width }
    }

    fn write_header(&self, writer: &mut dyn WriteColor, name: &str) -> Result<()> {
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(writer, " datasweep: {}", name)?;
        writeln!(writer, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        Ok(())
    }

    fn write_status(&self, writer: &mut dyn WriteColor, color: Color, text: &str) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(writer, "{}", text)?;
        writer.reset()?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_run(&self, writer: &mut dyn WriteColor, run: &FileRun) -> Result<()> {
        writeln!(writer, "Preview of {} ({} rows):", run.name, run.ingested_rows)?;
        writeln!(writer, "{}", preview_table(&run.preview))?;

        if let Some(ref clean) = run.clean {
            self.write_clean(writer, clean)?;
        }

        writeln!(
            writer,
            "Columns kept: {} ({} rows)",
            if run.table.column_count() == 0 {
                "(none)".to_string()
            } else {
                run.table.column_names().join(", ")
            },
            run.table.row_count()
        )?;

        if let Some(ref chart) = run.chart {
            self.write_chart(writer, chart)?;
        }

        if let Some(ref export) = run.export {
            writeln!(
                writer,
                "Converted to {}: {} ({}, {} bytes)",
                export.format,
                export.file_name,
                export.mime_type,
                export.len()
            )?;
        }

        writeln!(writer)?;
        Ok(())
    }

    fn write_clean(&self, writer: &mut dyn WriteColor, clean: &CleanSummary) -> Result<()> {
        if let Some(removed) = clean.duplicates_removed {
            self.write_status(
                writer,
                Color::Green,
                &format!("✅ Duplicates removed ({})", removed),
            )?;
        }

        if let Some(ref imputed) = clean.imputed {
            self.write_status(
                writer,
                Color::Green,
                &format!(
                    "✅ Missing values filled ({} cells{})",
                    imputed.filled_cells,
                    if imputed.filled_columns.is_empty() {
                        String::new()
                    } else {
                        format!(" in {}", imputed.filled_columns.join(", "))
                    }
                ),
            )?;
            if !imputed.undefined_mean_columns.is_empty() {
                writeln!(
                    writer,
                    "   No values to average in {}; left empty",
                    imputed.undefined_mean_columns.join(", ")
                )?;
            }
        }

        Ok(())
    }

    fn write_chart(&self, writer: &mut dyn WriteColor, chart: &ChartData) -> Result<()> {
        if chart.is_empty() {
            writeln!(writer, "Chart: no numeric columns to plot")?;
            return Ok(());
        }

        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        writeln!(writer, "Bar chart ({}):", names.join(", "))?;

        let max = chart.max_abs();
        let label_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
        let shown = chart.len().min(CHART_ROW_LIMIT);

        for row in 0..shown {
            for (i, series) in chart.series.iter().enumerate() {
                let position = if i == 0 { row.to_string() } else { String::new() };
                write!(
                    writer,
                    "{:>5} {:<width$} │",
                    position,
                    series.name,
                    width = label_width
                )?;

                match series.values.get(row).copied().flatten() {
                    Some(value) => {
                        let len = bar_length(value, max, self.bar_width);
                        writer.set_color(
                            ColorSpec::new().set_fg(Some(SERIES_COLORS[i % SERIES_COLORS.len()])),
                        )?;
                        write!(writer, "{}", "█".repeat(len))?;
                        writer.reset()?;
                        writeln!(writer, " {}", value)?;
                    }
                    None => writeln!(writer, " (missing)")?,
                }
            }
        }

        if chart.len() > shown {
            writeln!(writer, "      … {} more rows", chart.len() - shown)?;
        }

        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        for outcome in &report.outcomes {
            self.write_header(writer, outcome.name())?;
            match outcome {
                FileOutcome::Succeeded(run) => self.write_run(writer, run)?,
                FileOutcome::Failed { error, .. } => {
                    self.write_status(writer, Color::Red, &format!("✗ {}", error))?;
                    writeln!(writer)?;
                }
            }
        }

        if report.all_succeeded() {
            self.write_status(writer, Color::Green, &format!("✅ {}", SUCCESS_MESSAGE))?;
        } else {
            self.write_status(
                writer,
                Color::Red,
                &format!(
                    "{} of {} files failed",
                    report.failure_count(),
                    report.outcomes.len()
                ),
            )?;
        }

        Ok(())
    }
}

/// Scale `value` to a bar of at most `width` cells
fn bar_length(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    let len = (value.abs() / max * width as f64).round() as usize;
    // Keep non-zero values visible
    if len == 0 && value != 0.0 {
        1
    } else {
        len.min(width)
    }
}

/// Render a table as a boxed text grid
pub fn preview_table(table: &Table) -> String {
    if table.column_count() == 0 {
        return "(no columns)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().map(|c| c.name.clone()));
    for row in &table.rows {
        builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
    }

    let mut grid = builder.build();
    grid.with(Style::rounded());
    grid.to_string()
}
