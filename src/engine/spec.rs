use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::classify::{classify_column, ColumnClassification};
use crate::config::EngineConfig;
use crate::data::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// FilterSpec – what a widget layer needs to render one control
// ---------------------------------------------------------------------------

/// Widget-agnostic description of one filter control. `Skipped` columns never
/// get a spec. Serialized with its `default` selection alongside the bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Multi-select over sorted options; default selection is empty.
    Categorical {
        column: String,
        options: Vec<CellValue>,
    },
    /// Numeric slider; default selection is the full `(min, max)`.
    NumericRange { column: String, min: f64, max: f64 },
    /// Date range picker; default selection is the full `(min, max)`.
    DateRange {
        column: String,
        min: NaiveDate,
        max: NaiveDate,
    },
}

/// Borrowed wire form of a [`FilterSpec`].
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SpecWire<'a> {
    Categorical {
        column: &'a str,
        options: &'a [CellValue],
        default: Selection,
    },
    NumericRange {
        column: &'a str,
        min: f64,
        max: f64,
        default: Selection,
    },
    DateRange {
        column: &'a str,
        min: NaiveDate,
        max: NaiveDate,
        default: Selection,
    },
}

impl Serialize for FilterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = self.default_selection();
        let wire = match self {
            FilterSpec::Categorical { column, options } => SpecWire::Categorical {
                column,
                options,
                default,
            },
            FilterSpec::NumericRange { column, min, max } => SpecWire::NumericRange {
                column,
                min: *min,
                max: *max,
                default,
            },
            FilterSpec::DateRange { column, min, max } => SpecWire::DateRange {
                column,
                min: *min,
                max: *max,
                default,
            },
        };
        wire.serialize(serializer)
    }
}

/// A raw user selection for one column, as returned by a widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Values { values: Vec<CellValue> },
    NumericRange { lo: f64, hi: f64 },
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// A filter that actually narrows the rows of its column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveFilter {
    Categorical { allowed: BTreeSet<CellValue> },
    NumericRange { lo: f64, hi: f64 },
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl ActiveFilter {
    /// An empty filter carries no constraint and is ignored when applied.
    pub fn is_empty(&self) -> bool {
        match self {
            ActiveFilter::Categorical { allowed } => allowed.is_empty(),
            ActiveFilter::NumericRange { .. } | ActiveFilter::DateRange { .. } => false,
        }
    }
}

/// Active filters keyed by column name.
pub type ActiveFilters = BTreeMap<String, ActiveFilter>;

/// Raw selections keyed by column name.
pub type Selections = BTreeMap<String, Selection>;

impl FilterSpec {
    /// Build the spec for a classified column. `Skipped` yields `None`.
    pub fn from_classification(
        column: &str,
        classification: ColumnClassification,
    ) -> Option<FilterSpec> {
        let column = column.to_string();
        match classification {
            ColumnClassification::Categorical { options } => {
                Some(FilterSpec::Categorical { column, options })
            }
            ColumnClassification::NumericRange { min, max } => {
                Some(FilterSpec::NumericRange { column, min, max })
            }
            ColumnClassification::DateRange { min, max } => {
                Some(FilterSpec::DateRange { column, min, max })
            }
            ColumnClassification::Skipped => None,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            FilterSpec::Categorical { column, .. }
            | FilterSpec::NumericRange { column, .. }
            | FilterSpec::DateRange { column, .. } => column,
        }
    }

    /// The selection that restricts nothing.
    pub fn default_selection(&self) -> Selection {
        match self {
            FilterSpec::Categorical { .. } => Selection::Values { values: Vec::new() },
            FilterSpec::NumericRange { min, max, .. } => Selection::NumericRange { lo: *min, hi: *max },
            FilterSpec::DateRange { min, max, .. } => Selection::DateRange {
                start: *min,
                end: *max,
            },
        }
    }

    /// Reduce a raw selection to an active filter, or `None` when it does not
    /// narrow the column.
    ///
    /// Any non-empty categorical selection is active, even one naming every
    /// option. Range selections are active only when they differ from the
    /// full bounds.
    pub fn activate(&self, selection: &Selection) -> Option<ActiveFilter> {
        match (self, selection) {
            (FilterSpec::Categorical { .. }, Selection::Values { values }) => {
                let allowed: BTreeSet<CellValue> =
                    values.iter().filter(|v| !v.is_null()).cloned().collect();
                (!allowed.is_empty()).then_some(ActiveFilter::Categorical { allowed })
            }
            (FilterSpec::NumericRange { min, max, .. }, Selection::NumericRange { lo, hi }) => {
                (*lo != *min || *hi != *max)
                    .then_some(ActiveFilter::NumericRange { lo: *lo, hi: *hi })
            }
            (FilterSpec::DateRange { min, max, .. }, Selection::DateRange { start, end }) => {
                (*start > *min || *end < *max).then_some(ActiveFilter::DateRange {
                    start: *start,
                    end: *end,
                })
            }
            (spec, selection) => {
                log::warn!(
                    "Ignoring selection {selection:?} that does not match the filter for '{}'",
                    spec.column()
                );
                None
            }
        }
    }

    /// Resolve display labels back to option values of a categorical spec.
    /// Labels that match no option are dropped. `None` for range specs.
    pub fn selection_from_labels<S: AsRef<str>>(&self, labels: &[S]) -> Option<Selection> {
        let FilterSpec::Categorical { options, .. } = self else {
            return None;
        };
        let values = labels
            .iter()
            .filter_map(|label| {
                let found = options.iter().find(|o| o.to_string() == label.as_ref());
                if found.is_none() {
                    log::warn!(
                        "'{}' is not an option of '{}'",
                        label.as_ref(),
                        self.column()
                    );
                }
                found.cloned()
            })
            .collect();
        Some(Selection::Values { values })
    }
}

/// Classify every column and keep the specs of the non-skipped ones, in
/// column order.
pub fn build_specs(table: &Table, config: &EngineConfig) -> Vec<FilterSpec> {
    table
        .columns
        .iter()
        .filter_map(|col| FilterSpec::from_classification(&col.name, classify_column(col, config)))
        .collect()
}

/// Reduce raw selections to the active-filter map. Selections for columns
/// without a spec are ignored.
pub fn active_filters(specs: &[FilterSpec], selections: &Selections) -> ActiveFilters {
    specs
        .iter()
        .filter_map(|spec| {
            let selection = selections.get(spec.column())?;
            let filter = spec.activate(selection)?;
            Some((spec.column().to_string(), filter))
        })
        .collect()
}
