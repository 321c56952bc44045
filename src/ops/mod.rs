//! Table operations used by the clean and project stages

mod dedupe;
mod impute;
mod project;

use crate::error::Result;
use crate::model::Table;

pub use impute::ImputeSummary;

/// In-memory table operations
pub trait TabularOps: Sized {
    /// Remove rows equal to an earlier row. Returns how many were removed.
    fn deduplicate(&mut self) -> usize;

    /// Mean of the non-missing values of a numeric column.
    ///
    /// `None` if the column is not numeric or has no values.
    fn column_mean(&self, index: usize) -> Option<f64>;

    /// Fill missing cells of numeric columns with the column mean
    fn fill_missing_with_mean(&mut self) -> ImputeSummary;

    /// A new table with exactly the named columns, in the given order
    fn project(&self, columns: &[String]) -> Result<Self>;
}

impl TabularOps for Table {
    fn deduplicate(&mut self) -> usize {
        dedupe::drop_duplicates(self)
    }

    fn column_mean(&self, index: usize) -> Option<f64> {
        impute::column_mean(self, index)
    }

    fn fill_missing_with_mean(&mut self) -> ImputeSummary {
        impute::fill_missing_with_mean(self)
    }

    fn project(&self, columns: &[String]) -> Result<Self> {
        project::select_columns(self, columns)
    }
}
