//! Codecs for the supported tabular formats

mod csv;
mod excel;

use std::path::Path;

use crate::config::ExportFormat;
use crate::error::{Result, SweepError};
use crate::model::Table;

pub use self::csv::CsvCodec;
pub use self::excel::ExcelCodec;

/// Decode bytes into a [`Table`] and encode a [`Table`] back to bytes
pub trait TabularCodec: Send + Sync {
    /// The format this codec reads and writes
    fn format(&self) -> ExportFormat;

    /// Decode a whole file. `file_name` is only used in error messages.
    fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<Table>;

    /// Encode a table into a complete file
    fn encode(&self, table: &Table) -> Result<Vec<u8>>;

    /// Check if this codec handles the given lower-case extension
    fn supports_extension(&self, ext: &str) -> bool {
        ext == self.format().extension()
    }
}

/// Lower-cased extension of a file name, without the dot
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Registry of codecs, looked up by extension or target format
pub struct CodecRegistry {
    codecs: Vec<Box<dyn TabularCodec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Create a registry with every supported codec
    pub fn new() -> Self {
        Self {
            codecs: vec![Box::new(CsvCodec), Box::new(ExcelCodec)],
        }
    }

    /// Get the codec for a file name, by its extension
    pub fn for_file(&self, file_name: &str) -> Result<&dyn TabularCodec> {
        let ext = file_extension(file_name).unwrap_or_default();

        self.codecs
            .iter()
            .find(|codec| codec.supports_extension(&ext))
            .map(|codec| codec.as_ref())
            .ok_or_else(|| SweepError::UnsupportedFormat {
                file: file_name.to_string(),
                extension: if ext.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", ext)
                },
            })
    }

    /// Get the codec that writes the given format
    pub fn for_format(&self, format: ExportFormat) -> &dyn TabularCodec {
        match self.codecs.iter().find(|codec| codec.format() == format) {
            Some(codec) => codec.as_ref(),
            None => match format {
                ExportFormat::Csv => &CsvCodec,
                ExportFormat::Xlsx => &ExcelCodec,
            },
        }
    }

    /// Decode a file using the codec its extension selects
    pub fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<Table> {
        self.for_file(file_name)?.decode(file_name, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_is_lowercased() {
        assert_eq!(file_extension("Report.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(file_extension("a.b.csv").as_deref(), Some("csv"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".csv"), None);
    }

    #[test]
    fn test_for_file_picks_codec() {
        let registry = CodecRegistry::new();
        assert_eq!(registry.for_file("a.CSV").unwrap().format(), ExportFormat::Csv);
        assert_eq!(registry.for_file("b.xlsx").unwrap().format(), ExportFormat::Xlsx);
    }

    #[test]
    fn test_unsupported_extension() {
        let registry = CodecRegistry::new();
        let err = registry.for_file("notes.txt").err().unwrap();
        match err {
            SweepError::UnsupportedFormat { file, extension } => {
                assert_eq!(file, "notes.txt");
                assert_eq!(extension, ".txt");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.for_file("old.xls").is_err());
        assert!(registry.for_file("Makefile").is_err());
    }
}
