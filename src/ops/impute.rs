//! Mean imputation for numeric columns

use serde::Serialize;

use crate::model::{CellType, CellValue, Table};

/// What an imputation pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputeSummary {
    /// Number of cells that received a mean
    pub filled_cells: usize,
    /// Columns that had at least one cell filled
    pub filled_columns: Vec<String>,
    /// Numeric columns with no values at all; their mean is undefined
    /// so their missing cells stay missing.
    pub undefined_mean_columns: Vec<String>,
}

pub(super) fn column_mean(table: &Table, index: usize) -> Option<f64> {
    let column = table.columns.get(index)?;
    if !column.inferred_type.is_numeric() {
        return None;
    }

    let (sum, count) = table
        .column_values(index)
        .filter_map(CellValue::as_f64)
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));

    // inf and -inf together give NaN, which is no mean at all
    (count > 0)
        .then(|| sum / count as f64)
        .filter(|mean| !mean.is_nan())
}

/// Fill every missing numeric cell with its column's mean.
///
/// All means are taken before any cell changes. Columns that are not numeric
/// keep their missing cells.
pub(super) fn fill_missing_with_mean(table: &mut Table) -> ImputeSummary {
    table.infer_column_types();

    let mut summary = ImputeSummary::default();
    let mut means: Vec<(usize, f64)> = Vec::new();

    for column in &table.columns {
        match column.inferred_type {
            t if t.is_numeric() => match column_mean(table, column.index) {
                Some(mean) => means.push((column.index, mean)),
                None => summary.undefined_mean_columns.push(column.name.clone()),
            },
            // Every cell missing: numeric as far as we can tell, but no mean
            CellType::Null if table.row_count() > 0 => {
                summary.undefined_mean_columns.push(column.name.clone());
            }
            _ => {}
        }
    }

    for &(index, mean) in &means {
        let mut filled = 0;
        for row in &mut table.rows {
            if let Some(cell) = row.cells.get_mut(index) {
                if cell.is_null() {
                    *cell = CellValue::Float(mean);
                    filled += 1;
                }
            }
        }

        if filled > 0 {
            summary.filled_cells += filled;
            summary.filled_columns.push(table.columns[index].name.clone());
        }
    }

    table.infer_column_types();

    summary
}
