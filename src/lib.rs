//! datasweep - Clean, trim and convert tabular files
//!
//! Reads CSV and Excel files into a rectangular [`Table`], optionally removes
//! duplicate rows and fills missing numbers with the column mean, keeps a
//! chosen set of columns and writes the result back out as CSV or Excel.

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod output;
pub mod pipeline;

pub use config::{Config, ExportFormat, FileControls};
pub use error::SweepError;
pub use model::Table;
pub use pipeline::{BatchReport, ExportBuffer, Sweeper, UploadedFile};
