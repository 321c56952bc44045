//! CSV codec

use std::borrow::Cow;

use crate::config::ExportFormat;
use crate::error::{Result, SweepError};
use crate::model::{normalize_header_names, CellValue, Table};

use super::TabularCodec;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Tokens read as missing values
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

/// Comma-separated UTF-8 text with a header row
pub struct CsvCodec;

impl TabularCodec for CsvCodec {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<Table> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        // Read headers
        let headers = csv_reader
            .headers()
            .map_err(|e| SweepError::decode(file_name, e))?
            .clone();

        if headers.is_empty() {
            return Err(SweepError::decode(file_name, "No columns to parse from file"));
        }

        let mut table = Table::with_column_names(normalize_header_names(headers.iter()));

        for (idx, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|e| SweepError::decode(file_name, e))?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2); // +2 for 1-indexing and header

            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();

            table.add_row(cells, line).map_err(|e| {
                SweepError::decode(file_name, format!("line {}: {}", line, e))
            })?;
        }

        table.infer_column_types();

        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        if table.column_count() == 0 {
            return Ok(Vec::new());
        }

        let to_encode_err = |e: csv::Error| SweepError::encode(ExportFormat::Csv, e);
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(table.columns.iter().map(|c| c.name.as_str()))
            .map_err(to_encode_err)?;

        for row in &table.rows {
            writer
                .write_record(row.cells.iter().map(|c| c.display().into_owned()))
                .map_err(to_encode_err)?;
        }

        writer
            .into_inner()
            .map_err(|e| SweepError::encode(ExportFormat::Csv, e.error()))
    }
}

/// Parse a string value into a CellValue with type inference
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    if NA_TOKENS.contains(&trimmed) {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    // %.f also accepts a missing fraction
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return CellValue::DateTime(dt);
        }
    }

    CellValue::String(Cow::Owned(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    fn decode(text: &str) -> Result<Table> {
        CsvCodec.decode("test.csv", text.as_bytes())
    }

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("NaN"), CellValue::Null);
        assert_eq!(parse_cell_value("null"), CellValue::Null);
        assert_eq!(parse_cell_value("TRUE"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("false"), CellValue::Bool(false));
        assert_eq!(parse_cell_value("yes"), CellValue::from("yes"));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value("3.25"), CellValue::Float(3.25));
        assert!(matches!(parse_cell_value("2024-03-01"), CellValue::Date(_)));
        assert!(matches!(
            parse_cell_value("2024-03-01 12:30:00"),
            CellValue::DateTime(_)
        ));
        assert_eq!(
            parse_cell_value("hello"),
            CellValue::String(Cow::Owned("hello".to_string()))
        );
    }

    #[test]
    fn test_decode_missing_values_and_types() {
        let table = decode("id,val\n1,\n1,5\n2,7\n").unwrap();
        assert_eq!(table.column_names(), vec!["id", "val"]);
        assert_eq!(table.row_count(), 3);
        assert!(table.rows[0].cells[1].is_null());
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
        assert_eq!(table.columns[1].inferred_type, CellType::Int);
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"name\nx\n");
        let table = CsvCodec.decode("bom.csv", &bytes).unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
    }

    #[test]
    fn test_decode_renames_blank_and_duplicate_headers() {
        let table = decode("a,,a\n1,2,3\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "Unnamed: 1", "a.1"]);
    }

    #[test]
    fn test_decode_pads_short_rows() {
        let table = decode("a,b,c\n1\n").unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert!(table.is_well_formed());
    }

    #[test]
    fn test_decode_rejects_long_rows() {
        let err = decode("a,b\n1,2\n1,2,3\n").unwrap_err();
        assert!(matches!(err, SweepError::Decode { .. }));
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_decode_empty_file() {
        let err = decode("").unwrap_err();
        assert!(err.to_string().contains("No columns to parse"));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = CsvCodec.decode("bad.csv", b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert!(matches!(err, SweepError::Decode { .. }));
    }

    #[test]
    fn test_encode_writes_header_and_blank_nulls() {
        let table = decode("id,val\n1,\n2,7.5\n").unwrap();
        let bytes = CsvCodec.encode(&table).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "id,val\n1,\n2,7.5\n");
    }

    #[test]
    fn test_encode_quotes_embedded_commas() {
        let table = decode("name\n\"Smith, J\"\n").unwrap();
        let bytes = CsvCodec.encode(&table).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "name\n\"Smith, J\"\n");
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let table = decode("a,b,c\nx,1,2024-01-02\ny,,true\nz,3.5,\n").unwrap();
        let again = decode(&String::from_utf8(CsvCodec.encode(&table).unwrap()).unwrap()).unwrap();
        assert_eq!(again.column_names(), table.column_names());
        assert_eq!(again.row_count(), table.row_count());
    }

    #[test]
    fn test_encode_zero_columns_is_empty() {
        let table = Table::with_column_names(Vec::<String>::new());
        assert!(CsvCodec.encode(&table).unwrap().is_empty());
    }
}
