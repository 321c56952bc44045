//! Uploaded files and the buffers produced for download

use std::path::Path;

use serde::Serialize;

use crate::config::ExportFormat;
use crate::error::{Result, SweepError};

/// A file handed to the pipeline: its name (with extension) and raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The upload is named after the path's last component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| SweepError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// An encoded table ready to be saved or downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBuffer {
    pub file_name: String,
    pub mime_type: &'static str,
    pub format: ExportFormat,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportBuffer {
    pub fn new(source_name: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: output_file_name(source_name, format),
            mime_type: format.mime_type(),
            format,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Swap the extension of `name` for the format's canonical one
pub fn output_file_name(name: &str, format: ExportFormat) -> String {
    Path::new(name)
        .with_extension(format.extension())
        .to_string_lossy()
        .into_owned()
}
