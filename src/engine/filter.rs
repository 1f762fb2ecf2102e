use super::spec::{ActiveFilter, ActiveFilters};
use crate::config::EngineConfig;
use crate::data::dates::coerce_date;
use crate::data::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// Whether a single cell passes a filter.
///
/// * categorical – the cell is one of the allowed values; missing never is
/// * numeric     – the cell is a number within `lo..=hi`
/// * date        – the cell coerces to a date within `start..=end`
pub fn cell_matches(filter: &ActiveFilter, value: &CellValue, config: &EngineConfig) -> bool {
    match filter {
        ActiveFilter::Categorical { allowed } => !value.is_null() && allowed.contains(value),
        ActiveFilter::NumericRange { lo, hi } => value
            .as_f64()
            .is_some_and(|v| *lo <= v && v <= *hi),
        ActiveFilter::DateRange { start, end } => coerce_date(value, &config.date_formats)
            .is_some_and(|d| *start <= d && d <= *end),
    }
}

/// Return indices of rows that pass all active filters.
///
/// A row passes when, for every non-empty filter, its cell in that column
/// matches. Empty filters are treated as absent, and so are filters naming a
/// column the table does not have.
pub fn filtered_indices(table: &Table, filters: &ActiveFilters, config: &EngineConfig) -> Vec<usize> {
    let mut keep = vec![true; table.len()];

    for (col, filter) in filters {
        if filter.is_empty() {
            continue;
        }
        let Some(column) = table.column(col) else {
            log::warn!("Ignoring filter on unknown column '{col}'");
            continue;
        };
        for (flag, value) in keep.iter_mut().zip(&column.values) {
            if *flag && !cell_matches(filter, value, config) {
                *flag = false;
            }
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

/// The filtered view: a new table with only the passing rows, in their
/// original order and with the original columns.
pub fn apply_filters(table: &Table, filters: &ActiveFilters, config: &EngineConfig) -> Table {
    let indices = filtered_indices(table, filters, config);
    log::debug!(
        "{} of {} rows pass {} filter(s)",
        indices.len(),
        table.len(),
        filters.len()
    );
    table.take(&indices)
}
