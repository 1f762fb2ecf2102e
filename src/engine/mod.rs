//! Filter inference and summary engine.
//!
//! Architecture:
//! ```text
//!   Table ──► classify ──► ColumnClassification per column
//!                               │
//!                               ▼
//!                            spec ──► FilterSpec per column ──► (widget layer)
//!                               │                                   │
//!                               ◄──────── Selection per column ◄─────┘
//!                               ▼
//!                        ActiveFilters
//!                               │
//!                               ▼
//!                           filter ──► filtered Table ──► summary ──► Report
//! ```
//!
//! Every stage is a pure function; [`recompute`] runs the whole chain and is
//! meant to be called afresh on every interaction.

pub mod classify;
pub mod filter;
pub mod spec;
pub mod summary;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::data::model::Table;
use spec::{active_filters, build_specs, ActiveFilters, FilterSpec, Selections};
use summary::{build_report, KeyColumns, Report};

/// Output of one pass of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recomputation {
    /// One spec per non-skipped column, in column order.
    pub specs: Vec<FilterSpec>,
    /// Only filters that narrow their column.
    pub active: ActiveFilters,
    #[serde(skip)]
    pub filtered: Table,
    pub report: Report,
}

/// `(table, key columns, selections) -> (specs, active filters, filtered view, report)`.
pub fn recompute(
    table: &Table,
    keys: &KeyColumns,
    selections: &Selections,
    config: &EngineConfig,
) -> Recomputation {
    let specs = build_specs(table, config);
    let active = active_filters(&specs, selections);
    let filtered = filter::apply_filters(table, &active, config);
    let report = build_report(table.len(), &filtered, keys, config);

    log::info!(
        "Recomputed: {} filter specs, {} active, {} of {} rows",
        specs.len(),
        active.len(),
        filtered.len(),
        table.len()
    );

    Recomputation {
        specs,
        active,
        filtered,
        report,
    }
}
