use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Table};
use crate::error::{ExplorerError, Result};

/// Cell texts read as missing, following the usual spreadsheet/pandas markers.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column per field
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat columns (text, numbers, booleans, dates, timestamps)
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(std::fs::File::open(path)?),
        "json" => read_json(&std::fs::read_to_string(path)?),
        "parquet" | "pq" => load_parquet(path),
        other => Err(ExplorerError::UnsupportedFormat(other.to_string())),
    }?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Load several files and stack them into one table, the way a workbook's
/// sheets are concatenated.
pub fn load_files(paths: &[&Path]) -> Result<Table> {
    let parts = paths
        .iter()
        .map(|p| load_file(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::concat(parts))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV with a header row. Each column's type is inferred from all of its
/// cells: integers, then floats, then booleans, otherwise text. Date-like
/// text stays text; the classifier decides whether it is a date.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(ExplorerError::Schema(format!(
                "CSV row {row_no} has {} fields, expected {}",
                record.len(),
                headers.len()
            )));
        }
        for (cells, value) in raw.iter_mut().zip(record.iter()) {
            cells.push(value.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, infer_column(&cells)))
        .collect();
    Table::new(columns)
}

fn is_missing(s: &str) -> bool {
    MISSING_MARKERS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn infer_column(cells: &[String]) -> Vec<CellValue> {
    let present = || cells.iter().filter(|s| !is_missing(s));
    let convert = |f: &dyn Fn(&str) -> CellValue| -> Vec<CellValue> {
        cells
            .iter()
            .map(|s| if is_missing(s) { CellValue::Null } else { f(s) })
            .collect()
    };

    if present().all(|s| s.trim().parse::<i64>().is_ok()) {
        return convert(&|s| {
            s.trim()
                .parse::<i64>()
                .map_or(CellValue::Null, CellValue::Integer)
        });
    }
    if present().all(|s| s.trim().parse::<f64>().is_ok()) {
        return convert(&|s| match s.trim().parse::<f64>() {
            Ok(v) if !v.is_nan() => CellValue::Float(v),
            _ => CellValue::Null,
        });
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return convert(&|s| parse_bool(s).map_or(CellValue::Null, CellValue::Bool));
    }
    convert(&|s| CellValue::Text(s.to_string()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Linea": "L1", "Edad (días)": 42, "F. nacimiento": "2021-03-04" },
///   ...
/// ]
/// ```
///
/// Column order is the order of first appearance; absent keys are missing.
pub fn read_json(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| ExplorerError::Schema("expected top-level JSON array".to_string()))?;

    let mut columns: Vec<Column> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| ExplorerError::Schema(format!("row {i} is not a JSON object")))?;

        for key in obj.keys() {
            if !columns.iter().any(|c| &c.name == key) {
                columns.push(Column::new(key.clone(), vec![CellValue::Null; i]));
            }
        }
        for col in &mut columns {
            col.values
                .push(obj.get(&col.name).map_or(CellValue::Null, json_to_cell));
        }
    }
    Table::new(columns)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if is_missing(s) => CellValue::Null,
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result?;
        for (col, array) in columns.iter_mut().zip(batch.columns()) {
            col.values.extend(array_to_cells(array)?);
        }
    }

    Table::new(columns)
}

// -- Arrow helpers --

/// Convert a whole Arrow column into cells.
pub(crate) fn array_to_cells(array: &ArrayRef) -> Result<Vec<CellValue>> {
    let n = array.len();
    let cells = match array.data_type() {
        DataType::Null => vec![CellValue::Null; n],
        DataType::Utf8 => {
            let arr = array.as_string::<i32>();
            (0..n)
                .map(|i| text_cell(arr.is_null(i), || arr.value(i)))
                .collect()
        }
        DataType::LargeUtf8 => {
            let arr = array.as_string::<i64>();
            (0..n)
                .map(|i| text_cell(arr.is_null(i), || arr.value(i)))
                .collect()
        }
        DataType::Boolean => {
            let arr = array.as_boolean();
            (0..n)
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::Bool(arr.value(i))
                    }
                })
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let casted = cast(array, &DataType::Int64)?;
            let arr = casted.as_primitive::<Int64Type>();
            (0..n)
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        CellValue::Integer(arr.value(i))
                    }
                })
                .collect()
        }
        DataType::UInt64 | DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let casted = cast(array, &DataType::Float64)?;
            let arr = casted.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| {
                    let v = arr.value(i);
                    if arr.is_null(i) || v.is_nan() {
                        CellValue::Null
                    } else {
                        CellValue::Float(v)
                    }
                })
                .collect()
        }
        DataType::Date32 | DataType::Date64 => {
            let casted = cast(array, &DataType::Date32)?;
            let arr = casted.as_primitive::<Date32Type>();
            (0..n)
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        arr.value_as_date(i).map_or(CellValue::Null, CellValue::Date)
                    }
                })
                .collect()
        }
        DataType::Timestamp(_, _) => {
            let casted = cast(array, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            let arr = casted.as_primitive::<TimestampMillisecondType>();
            (0..n)
                .map(|i| {
                    if arr.is_null(i) {
                        CellValue::Null
                    } else {
                        arr.value_as_datetime(i)
                            .map_or(CellValue::Null, CellValue::DateTime)
                    }
                })
                .collect()
        }
        other => {
            log::warn!("Reading column of type {other:?} as text");
            let casted = cast(array, &DataType::Utf8)?;
            let arr = casted.as_string::<i32>();
            (0..n)
                .map(|i| text_cell(arr.is_null(i), || arr.value(i)))
                .collect()
        }
    };
    Ok(cells)
}

fn text_cell<'a>(null: bool, value: impl FnOnce() -> &'a str) -> CellValue {
    if null {
        return CellValue::Null;
    }
    let s = value();
    if is_missing(s) {
        CellValue::Null
    } else {
        CellValue::Text(s.to_string())
    }
}
