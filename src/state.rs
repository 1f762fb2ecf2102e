use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::data::model::{CellValue, Table};
use crate::engine::spec::{FilterSpec, Selection, Selections};
use crate::engine::summary::KeyColumns;
use crate::engine::{recompute, Recomputation};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Caller-side state of one explorer session: the uploaded table, the raw
/// selections and the latest pipeline output. The engine keeps no state of
/// its own; every interaction here reruns it.
#[derive(Debug, Default)]
pub struct Session {
    /// Uploaded table (None until a file is loaded).
    table: Option<Table>,

    /// Key columns for the summary tab.
    keys: KeyColumns,

    config: EngineConfig,

    /// Raw per-column selections.
    selections: Selections,

    /// Latest pipeline output (cached until the next interaction).
    view: Option<Recomputation>,
}

impl Session {
    pub fn new(keys: KeyColumns, config: EngineConfig) -> Self {
        Self {
            keys,
            config,
            ..Default::default()
        }
    }

    /// Ingest a newly loaded table. Previous selections no longer apply.
    pub fn set_table(&mut self, table: Table) {
        self.table = Some(table);
        self.selections.clear();
        self.refresh();
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn view(&self) -> Option<&Recomputation> {
        self.view.as_ref()
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    /// Specs of the current table, empty before a load.
    pub fn specs(&self) -> &[FilterSpec] {
        self.view
            .as_ref()
            .map(|v| v.specs.as_slice())
            .unwrap_or_default()
    }

    /// Rerun the pipeline over the current table and selections.
    pub fn refresh(&mut self) {
        self.view = self
            .table
            .as_ref()
            .map(|table| recompute(table, &self.keys, &self.selections, &self.config));
    }

    /// Replace one column's selection and recompute.
    pub fn select(&mut self, column: &str, selection: Selection) {
        self.selections.insert(column.to_string(), selection);
        self.refresh();
    }

    /// Toggle a single value in a categorical column's selection.
    pub fn toggle_value(&mut self, column: &str, value: &CellValue) {
        let entry = self
            .selections
            .entry(column.to_string())
            .or_insert_with(|| Selection::Values { values: Vec::new() });
        match entry {
            Selection::Values { values } => {
                if let Some(pos) = values.iter().position(|v| v == value) {
                    values.remove(pos);
                } else {
                    values.push(value.clone());
                }
            }
            other => {
                *other = Selection::Values {
                    values: vec![value.clone()],
                };
            }
        }
        self.refresh();
    }

    /// Select every option of a categorical column.
    ///
    /// This still yields an active filter, which drops rows whose value is
    /// missing.
    pub fn select_all(&mut self, column: &str) {
        let options = self.specs().iter().find_map(|spec| match spec {
            FilterSpec::Categorical { column: c, options } if c == column => Some(options.clone()),
            _ => None,
        });
        if let Some(values) = options {
            self.select(column, Selection::Values { values });
        }
    }

    /// Back to the default (non-restricting) selection for a column.
    pub fn select_none(&mut self, column: &str) {
        self.selections.remove(column);
        self.refresh();
    }

    pub fn set_numeric_range(&mut self, column: &str, lo: f64, hi: f64) {
        self.select(column, Selection::NumericRange { lo, hi });
    }

    pub fn set_date_range(&mut self, column: &str, start: NaiveDate, end: NaiveDate) {
        self.select(column, Selection::DateRange { start, end });
    }

    /// Drop every selection.
    pub fn clear_selection(&mut self) {
        self.selections.clear();
        self.refresh();
    }
}
