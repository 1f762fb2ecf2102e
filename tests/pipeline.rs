//! End-to-end tests of the filter pipeline: classification, activation,
//! filtering and summaries over one inventory-like table.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use inventory_explorer::config::EngineConfig;
use inventory_explorer::data::loader::read_csv;
use inventory_explorer::data::model::{CellValue, Column, Table};
use inventory_explorer::engine::classify::{classify_column, ColumnClassification};
use inventory_explorer::engine::filter::{apply_filters, filtered_indices};
use inventory_explorer::engine::recompute;
use inventory_explorer::engine::spec::{ActiveFilter, ActiveFilters, FilterSpec, Selection, Selections};
use inventory_explorer::engine::summary::{ColumnSummary, KeyColumns, KeyKind, Stat};

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 60 rows: Sexo with a missing value, 10 ages, 50 dates spanning 2018-2023
/// plus unparseable entries, a wide numeric column and a constant column.
fn inventory() -> Table {
    let rows = 60;
    let start = ymd(2018, 1, 15);
    let sexo = (0..rows)
        .map(|i| match i % 5 {
            4 => CellValue::Null,
            0 | 3 => text("M"),
            _ => text("F"),
        })
        .collect();
    let edad = (0..rows).map(|i| CellValue::Integer((i as i64 % 10 + 1) * 10)).collect();
    let fecha = (0..rows)
        .map(|i| {
            if i >= 50 {
                text("pendiente")
            } else {
                text(&(start + chrono::Duration::days(i as i64 * 43)).format("%Y-%m-%d").to_string())
            }
        })
        .collect();
    let peso = (0..rows).map(|i| CellValue::Float(10.0 + i as f64 * 0.5)).collect();
    let sala = (0..rows).map(|_| text("A1")).collect();

    Table::new(vec![
        Column::new("Sexo", sexo),
        Column::new("Edad", edad),
        Column::new("Fecha", fecha),
        Column::new("Peso", peso),
        Column::new("Sala", sala),
    ])
    .unwrap()
}

fn spec_for<'a>(specs: &'a [FilterSpec], column: &str) -> &'a FilterSpec {
    specs.iter().find(|s| s.column() == column).unwrap()
}

#[test]
fn specs_follow_classification_rules() {
    let out = recompute(&inventory(), &KeyColumns::inventory(), &Selections::new(), &EngineConfig::default());
    let columns: Vec<&str> = out.specs.iter().map(FilterSpec::column).collect();
    assert_eq!(columns, vec!["Sexo", "Edad", "Fecha", "Peso"], "constant column has no spec");

    assert!(matches!(spec_for(&out.specs, "Sexo"), FilterSpec::Categorical { options, .. } if options == &vec![text("F"), text("M")]));
    // Ten distinct ages: categorical, not a slider.
    assert!(matches!(spec_for(&out.specs, "Edad"), FilterSpec::Categorical { options, .. } if options.len() == 10));
    assert!(matches!(spec_for(&out.specs, "Peso"), FilterSpec::NumericRange { min, max, .. } if *min == 10.0 && *max == 39.5));
    match spec_for(&out.specs, "Fecha") {
        FilterSpec::DateRange { min, max, .. } => {
            assert_eq!(*min, ymd(2018, 1, 15));
            assert_eq!(*max, ymd(2018, 1, 15) + chrono::Duration::days(49 * 43));
        }
        other => panic!("expected date range, got {other:?}"),
    }
    assert!(out.active.is_empty());
    assert_eq!(out.filtered, inventory());
}

#[test]
fn example_sexo_selects_only_matching_rows() {
    let table = Table::new(vec![Column::new(
        "Sexo",
        vec![text("M"), text("F"), text("F"), text("M"), CellValue::Null],
    )])
    .unwrap();
    let config = EngineConfig::default();
    let classification = classify_column(table.column("Sexo").unwrap(), &config);
    assert_eq!(
        classification,
        ColumnClassification::Categorical {
            options: vec![text("F"), text("M")]
        }
    );

    let mut selections = Selections::new();
    selections.insert("Sexo".to_string(), Selection::Values { values: vec![text("F")] });
    let out = recompute(&table, &KeyColumns::inventory(), &selections, &config);
    assert_eq!(out.filtered.column("Sexo").unwrap().values, vec![text("F"), text("F")]);
}

#[test]
fn example_date_range_narrows_and_drops_unparseable() {
    let table = inventory();
    let mut selections = Selections::new();
    selections.insert(
        "Fecha".to_string(),
        Selection::DateRange {
            start: ymd(2019, 1, 1),
            end: ymd(2020, 12, 31),
        },
    );
    let out = recompute(&table, &KeyColumns::inventory(), &selections, &EngineConfig::default());
    assert!(matches!(out.active.get("Fecha"), Some(ActiveFilter::DateRange { .. })));

    // Unparseable cells never pass a date filter.
    for value in &out.filtered.column("Fecha").unwrap().values {
        let CellValue::Text(s) = value else {
            panic!("unexpected cell {value:?}");
        };
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(date >= ymd(2019, 1, 1) && date <= ymd(2020, 12, 31));
    }
    assert!(!out.filtered.is_empty());
    assert!(out.filtered.len() < 50);
}

#[test]
fn full_range_selections_produce_no_filters() {
    let table = inventory();
    let config = EngineConfig::default();
    let base = recompute(&table, &KeyColumns::inventory(), &Selections::new(), &config);

    let mut selections = Selections::new();
    for spec in &base.specs {
        selections.insert(spec.column().to_string(), spec.default_selection());
    }
    let out = recompute(&table, &KeyColumns::inventory(), &selections, &config);
    assert!(out.active.is_empty());
    assert_eq!(out.filtered.len(), table.len());
}

#[test]
fn numeric_range_is_inclusive() {
    let table = inventory();
    let mut selections = Selections::new();
    selections.insert("Peso".to_string(), Selection::NumericRange { lo: 12.0, hi: 14.0 });
    let out = recompute(&table, &KeyColumns::inventory(), &selections, &EngineConfig::default());
    let pesos: Vec<f64> = out
        .filtered
        .column("Peso")
        .unwrap()
        .values
        .iter()
        .filter_map(CellValue::as_f64)
        .collect();
    assert_eq!(pesos, vec![12.0, 12.5, 13.0, 13.5, 14.0]);
}

fn sample_filters() -> Vec<(String, ActiveFilter)> {
    vec![
        (
            "Sexo".to_string(),
            ActiveFilter::Categorical {
                allowed: BTreeSet::from([text("F")]),
            },
        ),
        ("Peso".to_string(), ActiveFilter::NumericRange { lo: 15.0, hi: 35.0 }),
        (
            "Fecha".to_string(),
            ActiveFilter::DateRange {
                start: ymd(2018, 6, 1),
                end: ymd(2022, 6, 1),
            },
        ),
    ]
}

#[test]
fn filtering_is_idempotent() {
    let table = inventory();
    let config = EngineConfig::default();
    let filters: ActiveFilters = sample_filters().into_iter().collect();

    let once = apply_filters(&table, &filters, &config);
    let twice = apply_filters(&once, &filters, &config);
    assert_eq!(once, twice);

    let again = apply_filters(&table, &filters, &config);
    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
}

#[test]
fn recompute_output_is_byte_identical() {
    let table = inventory();
    let config = EngineConfig::default();
    let mut selections = Selections::new();
    selections.insert("Sexo".to_string(), Selection::Values { values: vec![text("M")] });
    selections.insert("Peso".to_string(), Selection::NumericRange { lo: 12.0, hi: 30.0 });
    selections.insert(
        "Fecha".to_string(),
        Selection::DateRange {
            start: ymd(2019, 1, 1),
            end: ymd(2022, 12, 31),
        },
    );
    let keys = KeyColumns::new([
        ("Sexo", KeyKind::Categorical),
        ("Fecha", KeyKind::Date),
        ("Peso", KeyKind::Numeric),
    ]);

    let first = recompute(&table, &keys, &selections, &config);
    let second = recompute(&table, &keys, &selections, &config);
    assert_eq!(first.active.len(), 3);
    assert_eq!(first.report.columns.len(), 3);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.filtered, second.filtered);
}

#[test]
fn filters_commute() {
    let table = inventory();
    let config = EngineConfig::default();
    let filters = sample_filters();

    let mut forward = table.clone();
    for (col, filter) in &filters {
        let single: ActiveFilters = [(col.clone(), filter.clone())].into_iter().collect();
        forward = apply_filters(&forward, &single, &config);
    }
    let mut backward = table.clone();
    for (col, filter) in filters.iter().rev() {
        let single: ActiveFilters = [(col.clone(), filter.clone())].into_iter().collect();
        backward = apply_filters(&backward, &single, &config);
    }
    assert_eq!(forward, backward);

    let all: ActiveFilters = filters.into_iter().collect();
    assert_eq!(forward, apply_filters(&table, &all, &config));
    assert!(!filtered_indices(&table, &all, &config).is_empty());
}

#[test]
fn empty_result_yields_na_summaries() {
    let table = Table::new(vec![
        Column::new("Sexo", vec![text("M"), text("F"), text("M")]),
        Column::new(
            "Edad (días)",
            vec![CellValue::Null, CellValue::Integer(5), CellValue::Null],
        ),
    ])
    .unwrap();
    let keys = KeyColumns::new([("Edad (días)", KeyKind::Numeric), ("Sexo", KeyKind::Categorical)]);

    let mut selections = Selections::new();
    selections.insert("Sexo".to_string(), Selection::Values { values: vec![text("M")] });
    let out = recompute(&table, &keys, &selections, &EngineConfig::default());

    assert_eq!(out.report.total_rows, 3);
    assert_eq!(out.report.filtered_rows, 2);
    let ColumnSummary::Numeric(edad) = &out.report.columns[0].summary else {
        panic!("expected numeric summary");
    };
    assert_eq!(edad.min, Stat::NotAvailable);
    assert_eq!(edad.mean, Stat::NotAvailable);
    assert_eq!(edad.median, Stat::NotAvailable);
    assert_eq!(edad.max, Stat::NotAvailable);
    assert_eq!(edad.missing, 2);

    // A filter removing every row is a valid state, not an error.
    selections.insert("Sexo".to_string(), Selection::Values { values: vec![text("X")] });
    let out = recompute(&table, &keys, &selections, &EngineConfig::default());
    assert!(out.filtered.is_empty());
    assert_eq!(out.report.filtered_rows, 0);
}

#[test]
fn csv_upload_end_to_end() {
    let mut csv = String::from("Sexo,Edad (días),F. nacimiento,Linea\n");
    for i in 0..40 {
        let sexo = if i % 2 == 0 { "M" } else { "F" };
        let date = ymd(2020, 1, 1) + chrono::Duration::days(i * 9);
        csv.push_str(&format!("{sexo},{},{},L{}\n", 30 + i * 3, date.format("%d/%m/%Y"), i % 3));
    }
    let table = read_csv(csv.as_bytes()).unwrap();
    let out = recompute(&table, &KeyColumns::inventory(), &Selections::new(), &EngineConfig::default());

    assert!(matches!(spec_for(&out.specs, "Edad (días)"), FilterSpec::NumericRange { .. }));
    assert!(matches!(spec_for(&out.specs, "F. nacimiento"), FilterSpec::DateRange { .. }));
    let names: Vec<&str> = out.report.columns.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(names, vec!["Linea", "Sexo", "F. nacimiento", "Edad (días)"]);

    let ColumnSummary::Date(dates) = &out.report.columns[2].summary else {
        panic!("expected date summary");
    };
    assert_eq!(dates.valid, 40);
    assert_eq!(dates.histogram.len(), 30);
}
