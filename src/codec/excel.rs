//! Excel codec (xlsx): calamine reads, rust_xlsxwriter writes

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::config::ExportFormat;
use crate::error::{Result, SweepError};
use crate::model::{normalize_header_names, CellValue, Table};

use super::TabularCodec;

/// Name of the single worksheet written on export
pub const SHEET_NAME: &str = "Sheet1";

/// Office Open XML workbooks. Reads the first worksheet, writes one.
pub struct ExcelCodec;

impl TabularCodec for ExcelCodec {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<Table> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes)).map_err(|e| SweepError::decode(file_name, e))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SweepError::decode(file_name, "No sheets found in workbook"))?;

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| SweepError::decode(file_name, format!("sheet {}: {}", sheet_name, e)))?;

        parse_range(file_name, &range)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        let to_encode_err = |e: XlsxError| SweepError::encode(ExportFormat::Xlsx, e);

        let mut workbook = Workbook::new();
        {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, table).map_err(to_encode_err)?;
        }
        workbook.save_to_buffer().map_err(to_encode_err)
    }
}

fn parse_range(file_name: &str, range: &Range<Data>) -> Result<Table> {
    let mut rows = range.rows();

    // An empty sheet is an empty table
    let Some(header_row) = rows.next() else {
        return Ok(Table::with_column_names(Vec::<String>::new()));
    };

    let names = normalize_header_names(header_row.iter().map(cell_to_string));
    let mut table = Table::with_column_names(names);

    for (idx, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        let line = idx + 2; // +2 for 1-indexing and header
        table
            .add_row(cells, line)
            .map_err(|e| SweepError::decode(file_name, format!("row {}: {}", line, e)))?;
    }

    table.infer_column_types();

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        // Whitespace is a value; only a truly empty string is missing
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(e.to_string())),
    }
}

fn write_sheet(worksheet: &mut Worksheet, table: &Table) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col_idx, column) in table.columns.iter().enumerate() {
        let col = column_number(col_idx)?;
        worksheet.write_string_with_format(0, col, column.name.as_str(), &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        // Row 0 holds the header
        let excel_row = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;

        for (col_idx, cell) in row.cells.iter().enumerate() {
            let col = column_number(col_idx)?;
            match cell {
                CellValue::Null => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(excel_row, col, *i as f64)?;
                }
                CellValue::Float(f) if f.is_finite() => {
                    worksheet.write_number(excel_row, col, *f)?;
                }
                // Excel has no NaN or infinity
                CellValue::Float(f) => {
                    worksheet.write_string(excel_row, col, f.to_string())?;
                }
                CellValue::String(s) => {
                    let text: &str = s;
                    worksheet.write_string(excel_row, col, text)?;
                }
                CellValue::Date(d) => {
                    worksheet.write_datetime_with_format(excel_row, col, d, &date_format)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(excel_row, col, dt, &datetime_format)?;
                }
            }
        }
    }

    Ok(())
}

fn column_number(idx: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CsvCodec;
    use crate::model::CellType;

    fn sample() -> Table {
        CsvCodec
            .decode(
                "a.csv",
                b"id,val,name,day\n1,,x,2024-01-02\n1,5,y,\n2,7.5,,2024-02-03\n",
            )
            .unwrap()
    }

    #[test]
    fn test_round_trip_keeps_columns_and_rows() {
        let table = sample();
        let bytes = ExcelCodec.encode(&table).unwrap();
        let decoded = ExcelCodec.decode("a.xlsx", &bytes).unwrap();

        assert_eq!(decoded.column_names(), vec!["id", "val", "name", "day"]);
        assert_eq!(decoded.row_count(), 3);
        assert!(decoded.is_well_formed());
    }

    #[test]
    fn test_round_trip_keeps_values() {
        let table = sample();
        let bytes = ExcelCodec.encode(&table).unwrap();
        let decoded = ExcelCodec.decode("a.xlsx", &bytes).unwrap();

        assert_eq!(decoded.rows[0].cells[0], CellValue::Int(1));
        assert!(decoded.rows[0].cells[1].is_null());
        assert_eq!(decoded.rows[2].cells[1], CellValue::Float(7.5));
        assert_eq!(decoded.rows[1].cells[2], CellValue::from("y"));
        assert!(decoded.rows[2].cells[2].is_null());
        assert_eq!(decoded.columns[1].inferred_type, CellType::Float);
    }

    #[test]
    fn test_writes_single_named_sheet() {
        let bytes = ExcelCodec.encode(&sample()).unwrap();
        let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = ExcelCodec.decode("broken.xlsx", b"not a zip file").unwrap_err();
        assert!(matches!(err, SweepError::Decode { .. }));
        assert!(err.to_string().contains("broken.xlsx"));
    }

    #[test]
    fn test_header_only_sheet() {
        let table = Table::with_column_names(["id", "val"]);
        let bytes = ExcelCodec.encode(&table).unwrap();
        let decoded = ExcelCodec.decode("h.xlsx", &bytes).unwrap();
        assert_eq!(decoded.column_names(), vec!["id", "val"]);
        assert_eq!(decoded.row_count(), 0);
    }

    #[test]
    fn test_whitespace_cells_are_kept() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "a").unwrap();
        sheet.write_string(0, 1, "b").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(2, 1, " ").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let decoded = ExcelCodec.decode("w.xlsx", &bytes).unwrap();
        assert_eq!(decoded.row_count(), 2);
        assert!(decoded.rows[1].cells[0].is_null());
        assert_eq!(decoded.rows[1].cells[1], CellValue::from(" "));
    }
}
