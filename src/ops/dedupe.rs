//! Duplicate row removal

use rustc_hash::FxHashSet;

use crate::model::{CellValue, Table};

/// Keep the first occurrence of every distinct row, preserving order.
pub(super) fn drop_duplicates(table: &mut Table) -> usize {
    let before = table.rows.len();

    let mut seen: FxHashSet<Vec<CellValue>> = FxHashSet::default();
    table.rows.retain(|row| seen.insert(row.cells.clone()));

    before - table.rows.len()
}
