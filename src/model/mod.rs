//! Data model for tabular data representation

mod schema;
mod table;

pub use schema::{normalize_header_names, CellType, Column};
pub use table::{CellValue, Row, RowWidthError, Table};
