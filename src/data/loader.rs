use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Record, Value};
use super::store::RecordStore;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table into a [`RecordStore`].  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.csv`     – header row, cell types guessed
/// * `.json`    – `[{ "COLUMN": value, ... }, ...]`
/// * `.parquet` – flat columns (strings, ints, floats, bools, dates)
///
/// Column names are trimmed and uppercased before the store is built.
pub fn load_file(path: &Path) -> Result<RecordStore> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let store = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records with columns {:?} from {}",
        store.len(),
        store.columns().unwrap_or_default(),
        path.display()
    );
    Ok(store)
}

/// `"  Técnico "` → `"TÉCNICO"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Normalise the header row and pair every row with it.
fn build_store(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<RecordStore> {
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| match normalize_column_name(h) {
            name if name.is_empty() => format!("UNNAMED: {i}"),
            name => name,
        })
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.into_iter().enumerate() {
        if row.len() != columns.len() {
            bail!(
                "Row {row_no}: expected {} cells, found {}",
                columns.len(),
                row.len()
            );
        }
        records.push(columns.iter().cloned().zip(row).collect::<Record>());
    }

    Ok(RecordStore::from_records(columns, records)?)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<RecordStore> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("Workbook contains no sheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("Sheet has no header row")?
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    let body: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    build_store(headers, body)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        // Error cells (#N/A, #DIV/0!) carry no data.
        Data::Error(_) => Value::Null,
        Data::DateTime(dt) => Value::Float(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Date(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Spreadsheets store every number as a float; whole numbers read back as
/// integers so `2024` is offered as `2024`, not `2024.0`. The CSV and JSON
/// readers go through here too, so one column never holds both spellings.
fn float_value(f: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT {
        Value::Integer(f as i64)
    } else {
        Value::Float(f)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RecordStore> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_value_type).collect());
    }

    build_store(headers, rows)
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return float_value(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented layout, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "PRODUTOR": "Sítio Boa Vista", "DISTRITO": "Centro", "AREA": 3.5 },
///   ...
/// ]
/// ```
///
/// The column set is the union of keys; a key missing from a row is null.
fn load_json(path: &Path) -> Result<RecordStore> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let objects = root
        .as_array()
        .context("Expected top-level JSON array")?
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            rec.as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen = BTreeSet::new();
    let mut headers = Vec::new();
    for obj in &objects {
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(Value::Null, json_to_value))
                .collect()
        })
        .collect();

    build_store(headers, rows)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                float_value(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), as long as the columns are flat.
fn load_parquet(path: &Path) -> Result<RecordStore> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        // Row numbers in errors count from the start of the file.
        let offset = rows.len();
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_value(col, row))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Row {}", offset + row))?,
            );
        }
    }

    build_store(headers, rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => Value::Date(
            arrow::util::display::array_value_to_string(col, row)
                .context("formatting date cell")?,
        ),
        other => bail!("Unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{Criterion, FilterCriteria};
    use std::io::Write;

    use arrow::array::{BinaryArray, Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_headers_are_normalised_and_types_guessed() {
        let file = temp_file(
            ".csv",
            " Produtor ,tecnico,AREA\nSítio Boa Vista,Ana,3.5\nFazenda Lagoa,,2\n",
        );
        let store = load_file(file.path()).unwrap();
        assert_eq!(store.columns().unwrap(), ["PRODUTOR", "TECNICO", "AREA"]);

        let rows = store.records().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("AREA"), &Value::Float(3.5));
        assert_eq!(rows[1].get("AREA"), &Value::Integer(2));
        assert!(rows[1].get("TECNICO").is_null());
    }

    #[test]
    fn csv_ragged_rows_fail() {
        let file = temp_file(".csv", "A,B\n1,2\n3\n");
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn duplicate_normalised_headers_fail() {
        let file = temp_file(".csv", "distrito,DISTRITO \nX,Y\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate column"));
    }

    #[test]
    fn blank_headers_get_placeholder_names() {
        let file = temp_file(".csv", "tecnico,,area\nAna,x,1\nBia,,2\n");
        let store = load_file(file.path()).unwrap();
        assert_eq!(store.columns().unwrap(), ["TECNICO", "UNNAMED: 1", "AREA"]);
        let rows = store.records().unwrap();
        assert_eq!(rows[0].get("UNNAMED: 1"), &Value::from("x"));
        assert!(rows[1].get("UNNAMED: 1").is_null());
    }

    #[test]
    fn whole_csv_floats_read_as_integers() {
        let file = temp_file(".csv", "ANO,AREA\n2024,1\n2024.0,2.5\n");
        let store = load_file(file.path()).unwrap();
        assert_eq!(store.distinct_values("ANO").unwrap(), vec![Value::Integer(2024)]);
        assert_eq!(
            store.distinct_values("AREA").unwrap(),
            vec![Value::Integer(1), Value::Float(2.5)]
        );

        let criteria = FilterCriteria::new().with("ANO", Criterion::one_of([Value::Integer(2024)]));
        assert_eq!(store.filter(&criteria).unwrap().len(), 2);
    }

    #[test]
    fn whole_json_floats_read_as_integers() {
        let file = temp_file(".json", r#"[{"ano": 2024}, {"ano": 2024.0}, {"ano": 2.5}]"#);
        let store = load_file(file.path()).unwrap();
        assert_eq!(
            store.distinct_values("ANO").unwrap(),
            vec![Value::Integer(2024), Value::Float(2.5)]
        );
    }

    #[test]
    fn json_records_union_keys() {
        let file = temp_file(
            ".json",
            r#"[{"tecnico": "Ana", "val": 10}, {"tecnico": "Bia", "distrito": "X", "val": null}]"#,
        );
        let store = load_file(file.path()).unwrap();
        assert_eq!(store.columns().unwrap(), ["TECNICO", "VAL", "DISTRITO"]);
        let rows = store.records().unwrap();
        assert!(rows[0].get("DISTRITO").is_null());
        assert!(rows[1].get("VAL").is_null());
        assert_eq!(rows[0].get("VAL"), &Value::Integer(10));
    }

    #[test]
    fn json_must_be_array_of_objects() {
        let file = temp_file(".json", r#"{"tecnico": "Ana"}"#);
        assert!(load_file(file.path()).is_err());
        let file = temp_file(".json", r#"[1, 2]"#);
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn parquet_flat_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("distrito", DataType::Utf8, true),
            Field::new("area", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Centro"), None])),
                Arc::new(Float64Array::from(vec![Some(1.5), Some(2.0)])),
            ],
        )
        .unwrap();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let store = load_file(file.path()).unwrap();
        assert_eq!(store.columns().unwrap(), ["DISTRITO", "AREA"]);
        let rows = store.records().unwrap();
        assert_eq!(rows[0].get("DISTRITO"), &Value::from("Centro"));
        assert!(rows[1].get("DISTRITO").is_null());
        assert_eq!(rows[1].get("AREA"), &Value::Float(2.0));
    }

    #[test]
    fn parquet_errors_report_file_row() {
        // Past the reader's default batch size, so the bad cell is in batch two.
        let schema = Arc::new(Schema::new(vec![Field::new("blob", DataType::Binary, true)]));
        let blob = BinaryArray::from_iter((0..1100).map(|i| (i == 1050).then_some(b"x".as_slice())));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(blob)]).unwrap();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Row 1050"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = temp_file(".txt", "A\n1\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn spreadsheet_cells_map_to_values() {
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(cell_to_value(&Data::String("  ".into())), Value::Null);
        assert_eq!(cell_to_value(&Data::Float(2024.0)), Value::Integer(2024));
        assert_eq!(cell_to_value(&Data::Float(2.5)), Value::Float(2.5));
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::Bool(true));
        assert_eq!(
            cell_to_value(&Data::DateTimeIso("2024-03-01".into())),
            Value::Date("2024-03-01".into())
        );
    }

    #[test]
    fn normalises_names() {
        assert_eq!(normalize_column_name("  Técnico "), "TÉCNICO");
        assert_eq!(normalize_column_name("COMPRADOR"), "COMPRADOR");
    }
}
