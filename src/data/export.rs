use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use super::model::{CellValue, Table};
use crate::error::Result;

/// Default download name for a filtered table, e.g.
/// `archivo_filtrado_2025-07-11.csv`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("archivo_filtrado_{}.csv", today.format("%Y-%m-%d"))
}

/// Write a table as CSV: header row, columns in table order, no index
/// column. Missing cells are written empty.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in 0..table.len() {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|col| match col.values.get(row) {
                Some(CellValue::Null) | None => String::new(),
                Some(value) => value.to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a table as an Arrow batch of text columns, for pretty printing.
pub fn to_display_batch(table: &Table, max_rows: usize) -> Result<RecordBatch> {
    let rows = table.len().min(max_rows);
    let fields: Vec<Field> = table
        .columns
        .iter()
        .map(|col| Field::new(col.name.clone(), DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = table
        .columns
        .iter()
        .map(|col| {
            let cells: Vec<Option<String>> = col
                .values
                .iter()
                .take(rows)
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect();
            Arc::new(StringArray::from(cells)) as ArrayRef
        })
        .collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
