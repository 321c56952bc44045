//! Column selection

use indexmap::IndexSet;

use crate::error::{Result, SweepError};
use crate::model::{Column, Row, Table};

/// Build a table holding only `names`, in that order.
///
/// A repeated name is kept at its first position. An unknown name is an error.
pub(super) fn select_columns(table: &Table, names: &[String]) -> Result<Table> {
    let mut indices: IndexSet<usize> = IndexSet::with_capacity(names.len());
    for name in names {
        let idx = table
            .column_index(name)
            .ok_or_else(|| SweepError::UnknownColumn {
                column: name.clone(),
            })?;
        indices.insert(idx);
    }

    let columns = indices
        .iter()
        .enumerate()
        .map(|(new_idx, &old_idx)| {
            let old = &table.columns[old_idx];
            Column::with_type(old.name.clone(), new_idx, old.inferred_type)
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let cells = indices.iter().map(|&i| row.cells[i].clone()).collect();
            Row::new(cells, row.source_line)
        })
        .collect();

    Ok(Table { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CsvCodec, TabularCodec};
    use crate::model::CellValue;

    fn sample() -> Table {
        CsvCodec
            .decode("t.csv", b"id,val,name\n1,,a\n2,5,b\n")
            .unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_selection_is_identity() {
        let table = sample();
        let projected = select_columns(&table, &table.column_names()).unwrap();
        assert_eq!(projected, table);
    }

    #[test]
    fn test_reorders_columns() {
        let table = sample();
        let projected = select_columns(&table, &names(&["name", "id"])).unwrap();

        assert_eq!(projected.column_names(), vec!["name", "id"]);
        assert_eq!(projected.columns[1].index, 1);
        assert_eq!(projected.rows[1].cells, vec![CellValue::from("b"), CellValue::Int(2)]);
        assert!(projected.is_well_formed());
    }

    #[test]
    fn test_empty_selection_keeps_rows() {
        let table = sample();
        let projected = select_columns(&table, &[]).unwrap();
        assert_eq!(projected.column_count(), 0);
        assert_eq!(projected.row_count(), 2);
        assert!(projected.is_well_formed());
    }

    #[test]
    fn test_repeated_name_kept_once() {
        let table = sample();
        let projected = select_columns(&table, &names(&["val", "id", "val"])).unwrap();
        assert_eq!(projected.column_names(), vec!["val", "id"]);
    }

    #[test]
    fn test_unknown_column() {
        let table = sample();
        let err = select_columns(&table, &names(&["id", "missing"])).unwrap_err();
        assert!(matches!(err, SweepError::UnknownColumn { ref column } if column == "missing"));
    }
}
