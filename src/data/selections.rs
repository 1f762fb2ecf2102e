//! Raw selections as a widget layer (or a file) hands them over.
//!
//! ```json
//! {
//!   "Sexo": ["F"],
//!   "Edad (días)": [10, 20],
//!   "Peso": { "min": 20.5, "max": 31 },
//!   "F. nacimiento": { "start": "2019-01-01", "end": "2020-12-31" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::data::model::CellValue;
use crate::engine::spec::{FilterSpec, Selection, Selections};
use crate::error::Result;

/// One column's selection before it is matched against its filter spec.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSelection {
    /// Option labels, strings or numbers.
    Labels(Vec<JsonValue>),
    Dates { start: NaiveDate, end: NaiveDate },
    Range { min: f64, max: f64 },
}

pub type RawSelections = BTreeMap<String, RawSelection>;

pub fn read_selections(text: &str) -> Result<RawSelections> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_selections(path: &Path) -> Result<RawSelections> {
    read_selections(&std::fs::read_to_string(path)?)
}

/// Turn raw selections into typed ones using the specs they were made for.
/// Entries for columns without a spec, or of the wrong shape, are dropped.
pub fn resolve(specs: &[FilterSpec], raw: &RawSelections) -> Selections {
    let mut selections = Selections::new();
    for (column, raw_selection) in raw {
        let Some(spec) = specs.iter().find(|s| s.column() == column) else {
            log::warn!("No filter for column '{column}', selection ignored");
            continue;
        };
        let selection = match (spec, raw_selection) {
            (FilterSpec::Categorical { options, .. }, RawSelection::Labels(labels)) => {
                Some(Selection::Values {
                    values: labels
                        .iter()
                        .filter_map(|label| match_option(column, options, label))
                        .collect(),
                })
            }
            (FilterSpec::NumericRange { .. }, RawSelection::Range { min, max }) => {
                Some(Selection::NumericRange { lo: *min, hi: *max })
            }
            (FilterSpec::DateRange { .. }, RawSelection::Dates { start, end }) => {
                Some(Selection::DateRange {
                    start: *start,
                    end: *end,
                })
            }
            _ => {
                log::warn!("Selection for '{column}' does not fit its filter, ignored");
                None
            }
        };
        if let Some(selection) = selection {
            selections.insert(column.clone(), selection);
        }
    }
    selections
}

/// Find the option a JSON label stands for. Numbers and booleans match by
/// value, so `10.0`, `10` and `Float(10.0)` agree; strings match the
/// option's display text.
fn match_option(column: &str, options: &[CellValue], label: &JsonValue) -> Option<CellValue> {
    let found = match label {
        JsonValue::String(s) => options.iter().find(|o| o.to_string() == *s),
        JsonValue::Number(_) | JsonValue::Bool(_) => {
            let value = cell_of(label)?;
            options.iter().find(|o| **o == value)
        }
        _ => None,
    };
    if found.is_none() {
        log::warn!("{label} is not an option of '{column}'");
    }
    found.cloned()
}

fn cell_of(value: &JsonValue) -> Option<CellValue> {
    match value {
        JsonValue::Bool(b) => Some(CellValue::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(CellValue::Integer)
            .or_else(|| n.as_f64().map(CellValue::Float)),
        _ => None,
    }
}
