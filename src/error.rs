//! Errors raised while sweeping a single file

use thiserror::Error;

use crate::config::ExportFormat;

/// Everything that can stop one file's pipeline run.
///
/// None of these abort a batch; the batch driver records the error against
/// the file and moves on.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Unsupported file type: {extension} ({file})")]
    UnsupportedFormat { file: String, extension: String },

    #[error("Error reading {file}: {message}")]
    Decode { file: String, message: String },

    #[error("Column not found: {column}")]
    UnknownColumn { column: String },

    #[error("Failed to write {format}: {message}")]
    Encode { format: ExportFormat, message: String },

    #[error("Failed to read upload {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SweepError {
    pub(crate) fn decode(file: &str, message: impl std::fmt::Display) -> Self {
        SweepError::Decode {
            file: file.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(format: ExportFormat, message: impl std::fmt::Display) -> Self {
        SweepError::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Short machine-readable kind, used in JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            SweepError::UnsupportedFormat { .. } => "unsupported_format",
            SweepError::Decode { .. } => "decode",
            SweepError::UnknownColumn { .. } => "unknown_column",
            SweepError::Encode { .. } => "encode",
            SweepError::Io { .. } => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
