use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::data::dates::coerce_date;
use crate::data::model::{CellValue, Column, Table, ValueKind};

// ---------------------------------------------------------------------------
// ColumnClassification – which filter kind a column gets
// ---------------------------------------------------------------------------

/// The filter kind chosen for one column, with the parameters it needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnClassification {
    /// Few distinct values: sorted distinct non-missing values.
    Categorical { options: Vec<CellValue> },
    /// Many distinct numbers; `min != max`.
    NumericRange { min: f64, max: f64 },
    /// Many distinct date-like values; at least two distinct valid dates.
    DateRange { min: NaiveDate, max: NaiveDate },
    /// No discriminating information.
    Skipped,
}

/// Classify one column. First matching rule wins:
///
/// 1. at most one distinct non-missing value → `Skipped`
/// 2. at most `categorical_threshold` distinct values → `Categorical`,
///    whatever the underlying kind
/// 3. temporal or text column → `DateRange` if coercion yields more than one
///    distinct date, else `Skipped`
/// 4. numeric column → `NumericRange` if `min != max`, else `Skipped`
/// 5. anything else → `Skipped`
pub fn classify_column(column: &Column, config: &EngineConfig) -> ColumnClassification {
    let distinct = column.distinct_values();
    let n_distinct = distinct.len();

    let classification = if n_distinct <= 1 {
        ColumnClassification::Skipped
    } else if n_distinct <= config.categorical_threshold {
        ColumnClassification::Categorical {
            options: distinct.into_iter().collect(),
        }
    } else {
        match column.kind() {
            ValueKind::Temporal | ValueKind::Text => date_range(&distinct, config),
            ValueKind::Numeric => numeric_range(&distinct),
            ValueKind::Boolean => ColumnClassification::Skipped,
        }
    };

    log::debug!(
        "Column '{}' ({} distinct) classified as {:?}",
        column.name,
        n_distinct,
        ClassificationTag(&classification)
    );
    classification
}

/// Classify every column of a table, in column order.
pub fn classify_table<'a>(
    table: &'a Table,
    config: &EngineConfig,
) -> Vec<(&'a str, ColumnClassification)> {
    table
        .columns
        .iter()
        .map(|col| (col.name.as_str(), classify_column(col, config)))
        .collect()
}

/// Date bounds over the coerced values. Distinctness is counted on calendar
/// dates, so many timestamps falling on one day still make the column
/// `Skipped` rather than a zero-width range.
fn date_range(distinct: &BTreeSet<CellValue>, config: &EngineConfig) -> ColumnClassification {
    let dates: BTreeSet<NaiveDate> = distinct
        .iter()
        .filter_map(|v| coerce_date(v, &config.date_formats))
        .collect();

    match (dates.first(), dates.last()) {
        (Some(&min), Some(&max)) if dates.len() > 1 => ColumnClassification::DateRange { min, max },
        _ => ColumnClassification::Skipped,
    }
}

fn numeric_range(distinct: &BTreeSet<CellValue>) -> ColumnClassification {
    // `distinct` is sorted numerically for a numeric column.
    let mut numbers = distinct.iter().filter_map(CellValue::as_f64);
    let min = numbers.next();
    let max = numbers.last().or(min);
    match (min, max) {
        (Some(min), Some(max)) if min != max => ColumnClassification::NumericRange { min, max },
        _ => ColumnClassification::Skipped,
    }
}

/// Short debug label that avoids dumping every categorical option.
struct ClassificationTag<'a>(&'a ColumnClassification);

impl std::fmt::Debug for ClassificationTag<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ColumnClassification::Categorical { options } => {
                write!(f, "Categorical({} options)", options.len())
            }
            ColumnClassification::NumericRange { min, max } => {
                write!(f, "NumericRange({min}..={max})")
            }
            ColumnClassification::DateRange { min, max } => write!(f, "DateRange({min}..={max})"),
            ColumnClassification::Skipped => write!(f, "Skipped"),
        }
    }
}
