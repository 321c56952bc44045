//! HTML report output

use anyhow::Result;
use termcolor::WriteColor;

use crate::model::Table;
use crate::pipeline::{BatchReport, ChartData, FileOutcome, FileRun};

use super::{OutputFormatter, CHART_ROW_LIMIT, SUCCESS_MESSAGE};

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 240.0;
const SERIES_FILLS: [&str; 2] = ["#29b5e8", "#f5a623"];

/// HTML report output
pub struct HtmlOutput;

impl HtmlOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for HtmlOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html lang=\"en\">")?;
        writeln!(writer, "<head>")?;
        writeln!(writer, "  <meta charset=\"UTF-8\">")?;
        writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
        writeln!(writer, "  <title>Data Sweeper</title>")?;
        writeln!(writer, "  <style>")?;
        writeln!(writer, "{}", CSS_STYLES)?;
        writeln!(writer, "  </style>")?;
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;

        writeln!(writer, "  <div class=\"header\">")?;
        writeln!(writer, "    <h1>Data Sweeper</h1>")?;
        writeln!(
            writer,
            "    <p>Files converted between CSV and Excel, with optional cleaning.</p>"
        )?;
        writeln!(writer, "  </div>")?;

        for outcome in &report.outcomes {
            writeln!(writer, "  <div class=\"section\">")?;
            writeln!(writer, "    <h2>{}</h2>", html_escape(outcome.name()))?;
            match outcome {
                FileOutcome::Succeeded(run) => write_run(writer, run)?,
                FileOutcome::Failed { error, .. } => {
                    writeln!(writer, "    <p class=\"error\">{}</p>", html_escape(error.to_string()))?;
                }
            }
            writeln!(writer, "  </div>")?;
        }

        if report.all_succeeded() {
            writeln!(writer, "  <p class=\"success\">✅ {}</p>", SUCCESS_MESSAGE)?;
        } else {
            writeln!(
                writer,
                "  <p class=\"error\">{} of {} files failed</p>",
                report.failure_count(),
                report.outcomes.len()
            )?;
        }

        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")?;

        Ok(())
    }
}

fn write_run(writer: &mut dyn WriteColor, run: &FileRun) -> Result<()> {
    writeln!(writer, "    <h3>Preview ({} rows)</h3>", run.ingested_rows)?;
    write_table(writer, &run.preview)?;

    if let Some(ref clean) = run.clean {
        writeln!(writer, "    <h3>Data Cleaning</h3>")?;
        writeln!(writer, "    <ul>")?;
        if let Some(removed) = clean.duplicates_removed {
            writeln!(writer, "      <li>✅ Duplicates removed ({})</li>", removed)?;
        }
        if let Some(ref imputed) = clean.imputed {
            writeln!(
                writer,
                "      <li>✅ Missing values filled ({} cells)</li>",
                imputed.filled_cells
            )?;
            for name in &imputed.undefined_mean_columns {
                writeln!(
                    writer,
                    "      <li>No values to average in {}; left empty</li>",
                    html_escape(name)
                )?;
            }
        }
        writeln!(writer, "    </ul>")?;
    }

    writeln!(writer, "    <h3>Columns Kept</h3>")?;
    writeln!(
        writer,
        "    <p>{} ({} rows)</p>",
        html_escape(run.table.column_names().join(", ")),
        run.table.row_count()
    )?;

    if let Some(ref chart) = run.chart {
        writeln!(writer, "    <h3>Data Visualization</h3>")?;
        write_chart(writer, chart)?;
    }

    if let Some(ref export) = run.export {
        writeln!(writer, "    <h3>Conversion</h3>")?;
        writeln!(
            writer,
            "    <p class=\"download\">{} as {} <span class=\"mime\">{}, {} bytes</span></p>",
            html_escape(&export.file_name),
            export.format,
            export.mime_type,
            export.len()
        )?;
    }

    Ok(())
}

fn write_table(writer: &mut dyn WriteColor, table: &Table) -> Result<()> {
    writeln!(writer, "    <table>")?;

    // Header
    writeln!(writer, "      <tr>")?;
    for col in &table.columns {
        writeln!(writer, "        <th>{}</th>", html_escape(&col.name))?;
    }
    writeln!(writer, "      </tr>")?;

    // Rows
    for row in &table.rows {
        writeln!(writer, "      <tr>")?;
        for cell in &row.cells {
            writeln!(writer, "        <td>{}</td>", html_escape(cell.display()))?;
        }
        writeln!(writer, "      </tr>")?;
    }

    writeln!(writer, "    </table>")?;
    Ok(())
}

/// Inline SVG grouped bar chart, one group per row position
fn write_chart(writer: &mut dyn WriteColor, chart: &ChartData) -> Result<()> {
    if chart.is_empty() {
        writeln!(writer, "    <p>No numeric columns to plot.</p>")?;
        return Ok(());
    }

    let rows = chart.len().min(CHART_ROW_LIMIT);
    let max = chart.max_abs();
    let has_negative = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .any(|v| *v < 0.0);

    // With negatives the axis sits in the middle
    let baseline = if has_negative { CHART_HEIGHT / 2.0 } else { CHART_HEIGHT };
    let span = if has_negative { CHART_HEIGHT / 2.0 } else { CHART_HEIGHT };
    let group_width = CHART_WIDTH / rows.max(1) as f64;
    let bar_width = group_width * 0.8 / chart.series.len() as f64;

    writeln!(
        writer,
        "    <svg class=\"chart\" viewBox=\"0 0 {} {}\" role=\"img\">",
        CHART_WIDTH, CHART_HEIGHT
    )?;
    for row in 0..rows {
        for (i, series) in chart.series.iter().enumerate() {
            let Some(value) = series.values.get(row).copied().flatten() else {
                continue;
            };
            if !value.is_finite() || max <= 0.0 {
                continue;
            }
            let height = value.abs() / max * span;
            let x = row as f64 * group_width + group_width * 0.1 + i as f64 * bar_width;
            let y = if value >= 0.0 { baseline - height } else { baseline };
            writeln!(
                writer,
                "      <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"><title>{} [{}]: {}</title></rect>",
                x,
                y,
                bar_width,
                height,
                SERIES_FILLS[i % SERIES_FILLS.len()],
                html_escape(&series.name),
                row,
                value
            )?;
        }
    }
    writeln!(
        writer,
        "      <line x1=\"0\" y1=\"{0}\" x2=\"{1}\" y2=\"{0}\" class=\"axis\"/>",
        baseline, CHART_WIDTH
    )?;
    writeln!(writer, "    </svg>")?;

    writeln!(writer, "    <p class=\"legend\">")?;
    for (i, series) in chart.series.iter().enumerate() {
        writeln!(
            writer,
            "      <span style=\"color: {}\">■ {}</span>",
            SERIES_FILLS[i % SERIES_FILLS.len()],
            html_escape(&series.name)
        )?;
    }
    if chart.len() > rows {
        writeln!(writer, "      <span>first {} of {} rows</span>", rows, chart.len())?;
    }
    writeln!(writer, "    </p>")?;

    Ok(())
}

fn html_escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS_STYLES: &str = r#"
    :root {
      --bg: #000000;
      --fg: #ffffff;
      --accent: #29b5e8;
      --green: #9ece6a;
      --red: #f7768e;
      --border: #3a3a3a;
    }

    * { box-sizing: border-box; margin: 0; padding: 0; }

    body {
      font-family: 'Source Sans Pro', sans-serif;
      background: var(--bg);
      color: var(--fg);
      padding: 2rem;
      line-height: 1.6;
    }

    .header {
      border-bottom: 2px solid var(--border);
      padding-bottom: 1rem;
      margin-bottom: 2rem;
    }

    .header h1 {
      font-size: 2rem;
      font-weight: 600;
    }

    .section {
      margin-bottom: 2rem;
    }

    .section h2 {
      color: var(--accent);
      font-size: 1.25rem;
      margin-bottom: 1rem;
      padding-bottom: 0.5rem;
      border-bottom: 1px solid var(--border);
    }

    .section h3 {
      font-size: 1rem;
      margin: 1rem 0 0.5rem;
    }

    table {
      border-collapse: collapse;
      margin-bottom: 1rem;
    }

    th, td {
      text-align: left;
      padding: 0.4rem 0.75rem;
      border: 1px solid var(--border);
    }

    th {
      background: rgba(255,255,255,0.08);
      font-weight: 600;
    }

    ul {
      list-style: none;
    }

    .chart {
      width: 100%;
      max-width: 640px;
      background: rgba(255,255,255,0.03);
    }

    .chart .axis {
      stroke: var(--border);
    }

    .legend span {
      margin-right: 1rem;
    }

    .mime {
      opacity: 0.6;
      font-size: 0.875rem;
    }

    .error { color: var(--red); }
    .success { color: var(--green); font-weight: 600; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FileControls};
    use crate::pipeline::{Sweeper, UploadedFile};
    use termcolor::Buffer;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_render_page() {
        let config = Config::default().with_defaults(FileControls::new().with_chart(true));
        let report = Sweeper::new().run_batch(
            vec![
                UploadedFile::new("<a>.csv", "n,m\n1,-2\n3,4\n"),
                UploadedFile::new("b.txt", "x"),
            ],
            &config,
        );

        let mut buffer = Buffer::no_color();
        HtmlOutput::new().render(&report, &mut buffer).unwrap();
        let page = String::from_utf8(buffer.into_inner()).unwrap();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h2>&lt;a&gt;.csv</h2>"));
        assert_eq!(page.matches("<rect ").count(), 4);
        assert!(page.contains("1 of 2 files failed"));
        assert!(page.trim_end().ends_with("</html>"));
    }
}
