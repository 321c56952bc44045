//! Output formatting for batch reports

mod html;
mod json;
mod terminal;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::ReportFormat;
use crate::pipeline::BatchReport;

pub use html::HtmlOutput;
pub use json::JsonOutput;
pub use terminal::{preview_table, TerminalOutput};

/// Charts draw at most this many rows
pub const CHART_ROW_LIMIT: usize = 50;

/// Message shown when every file in the batch went through
pub const SUCCESS_MESSAGE: &str = "All files processed successfully!";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a batch report to a writer
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: ReportFormat) -> Box<dyn OutputFormatter> {
        match format {
            ReportFormat::Terminal => Box::new(TerminalOutput::new()),
            ReportFormat::Json => Box::new(JsonOutput::new()),
            ReportFormat::Html => Box::new(HtmlOutput::new()),
        }
    }
}

/// Render a batch report to stdout
pub fn render_to_stdout(report: &BatchReport, format: ReportFormat) -> Result<()> {
    let formatter = OutputFactory::create(format);
    let choice = match format {
        ReportFormat::Terminal => ColorChoice::Auto,
        _ => ColorChoice::Never,
    };
    let mut stdout = StandardStream::stdout(choice);
    formatter.render(report, &mut stdout)
}
