//! Bar chart data drawn from the numeric columns of a table

use serde::Serialize;

use crate::model::Table;

/// How many numeric columns the chart shows
pub const MAX_SERIES: usize = 2;

/// One bar series: a column's values by row position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// `None` for missing cells
    pub values: Vec<Option<f64>>,
}

/// Bar chart over row positions, one series per numeric column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub series: Vec<Series>,
}

impl ChartData {
    /// Take the first two numeric columns, in column order
    pub fn from_table(table: &Table) -> Self {
        let series = table
            .numeric_columns()
            .into_iter()
            .take(MAX_SERIES)
            .map(|idx| Series {
                name: table.columns[idx].name.clone(),
                values: table.column_values(idx).map(|c| c.as_f64()).collect(),
            })
            .collect();

        Self { series }
    }

    /// True when the table had no numeric column to draw
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of bars per series
    pub fn len(&self) -> usize {
        self.series.first().map_or(0, |s| s.values.len())
    }

    /// Largest absolute value across all series, used for scaling
    pub fn max_abs(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}
