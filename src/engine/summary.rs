use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::EngineConfig;
use crate::data::dates::{coerce_date, epoch_days, from_epoch_days};
use crate::data::model::{CellValue, Column, Table};
use crate::error::ExplorerError;

// ---------------------------------------------------------------------------
// Key columns
// ---------------------------------------------------------------------------

/// Semantic kind of a key column, chosen up front rather than inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    #[serde(alias = "cat")]
    Categorical,
    #[serde(alias = "num")]
    Numeric,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumn {
    pub name: String,
    pub kind: KeyKind,
}

/// Ordered list of columns to summarize. Order is the report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyColumns(pub Vec<KeyColumn>);

impl KeyColumns {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, KeyKind)>) -> Self {
        KeyColumns(
            columns
                .into_iter()
                .map(|(name, kind)| KeyColumn {
                    name: name.into(),
                    kind,
                })
                .collect(),
        )
    }

    /// The key columns of the laboratory animal inventory.
    pub fn inventory() -> Self {
        Self::new([
            ("Linea", KeyKind::Categorical),
            ("Acrónimo línea", KeyKind::Categorical),
            ("Sexo", KeyKind::Categorical),
            ("Cepa", KeyKind::Categorical),
            ("Jaula", KeyKind::Categorical),
            ("Cruce origen", KeyKind::Categorical),
            ("F. nacimiento", KeyKind::Date),
            ("Edad (días)", KeyKind::Numeric),
            ("Gen", KeyKind::Categorical),
        ])
    }

    /// Load key columns from a JSON list of `{"name": .., "kind": ..}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ExplorerError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyColumn> {
        self.0.iter()
    }
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self::inventory()
    }
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// A statistic, or the `NA` sentinel when there is nothing to compute it on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stat {
    Value(f64),
    NotAvailable,
}

impl Stat {
    fn from_option(v: Option<f64>) -> Self {
        v.map_or(Stat::NotAvailable, Stat::Value)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Stat::Value(v) => Some(*v),
            Stat::NotAvailable => None,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Value(v) => write!(f, "{v:.2}"),
            Stat::NotAvailable => write!(f, "NA"),
        }
    }
}

impl Serialize for Stat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Stat::Value(v) => serializer.serialize_f64(*v),
            Stat::NotAvailable => serializer.serialize_str("NA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: CellValue,
    pub count: usize,
}

/// Renderer hint for a categorical chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChart {
    pub kind: ChartKind,
    pub entries: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    /// Full frequency table, missing included, by count descending.
    pub counts: Vec<CategoryCount>,
    /// Head of `counts` shown as a table.
    pub top: Vec<CategoryCount>,
    pub chart: CategoryChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: Stat,
    pub mean: Stat,
    pub median: Stat,
    pub max: Stat,
    /// Missing or non-numeric cells.
    pub missing: usize,
    /// Non-missing values in row order, for a box/point plot.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub start: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateSummary {
    pub valid: usize,
    /// Missing cells plus cells that do not coerce to a date.
    pub missing: usize,
    pub bin_width_days: f64,
    pub histogram: Vec<DateBucket>,
    /// Per-year counts by count descending, truncated.
    pub years: Vec<YearCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSummary {
    Categorical(CategoricalSummary),
    Numeric(NumericSummary),
    Date(DateSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub summary: ColumnSummary,
}

/// Everything the summary tab shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnReport>,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Summarize each key column present in `table`, in key order. Key columns
/// the table lacks are skipped.
pub fn summarize(table: &Table, keys: &KeyColumns, config: &EngineConfig) -> Vec<ColumnReport> {
    keys.iter()
        .filter_map(|key| {
            let column = table.column(&key.name)?;
            let summary = match key.kind {
                KeyKind::Categorical => ColumnSummary::Categorical(summarize_categorical(column, config)),
                KeyKind::Numeric => ColumnSummary::Numeric(summarize_numeric(column)),
                KeyKind::Date => ColumnSummary::Date(summarize_dates(column, config)),
            };
            Some(ColumnReport {
                column: key.name.clone(),
                summary,
            })
        })
        .collect()
}

/// Build the full report for a filtered view of a table with `total_rows`.
pub fn build_report(
    total_rows: usize,
    filtered: &Table,
    keys: &KeyColumns,
    config: &EngineConfig,
) -> Report {
    Report {
        total_rows,
        filtered_rows: filtered.len(),
        column_count: filtered.column_count(),
        columns: summarize(filtered, keys, config),
    }
}

pub fn summarize_categorical(column: &Column, config: &EngineConfig) -> CategoricalSummary {
    let mut freq: BTreeMap<&CellValue, usize> = BTreeMap::new();
    for value in &column.values {
        *freq.entry(value).or_default() += 1;
    }

    // Stable sort keeps ties in value order.
    let mut counts: Vec<CategoryCount> = freq
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value: value.clone(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    let top = counts.iter().take(config.top_categories).cloned().collect();
    let chart = if counts.len() > config.pie_chart_max_categories {
        CategoryChart {
            kind: ChartKind::Bar,
            entries: counts.iter().take(config.bar_chart_top).cloned().collect(),
        }
    } else {
        CategoryChart {
            kind: ChartKind::Pie,
            entries: counts.clone(),
        }
    };

    CategoricalSummary { counts, top, chart }
}

pub fn summarize_numeric(column: &Column) -> NumericSummary {
    let values: Vec<f64> = column.values.iter().filter_map(CellValue::as_f64).collect();
    let missing = column.len() - values.len();

    let min = values.iter().copied().reduce(f64::min);
    let max = values.iter().copied().reduce(f64::max);
    let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

    NumericSummary {
        min: Stat::from_option(min),
        mean: Stat::from_option(mean),
        median: Stat::from_option(median(&values)),
        max: Stat::from_option(max),
        missing,
        values,
    }
}

fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mid = n / 2;
    match n {
        0 => None,
        _ if n % 2 == 1 => sorted.get(mid).copied(),
        _ => Some((sorted.get(mid - 1)? + sorted.get(mid)?) / 2.0),
    }
}

pub fn summarize_dates(column: &Column, config: &EngineConfig) -> DateSummary {
    let dates: Vec<NaiveDate> = column
        .values
        .iter()
        .filter_map(|v| coerce_date(v, &config.date_formats))
        .collect();
    let missing = column.len() - dates.len();

    let (bin_width_days, histogram) = date_histogram(&dates, config.histogram_buckets);

    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for d in &dates {
        *per_year.entry(d.year()).or_default() += 1;
    }
    let mut years: Vec<YearCount> = per_year
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect();
    years.sort_by(|a, b| b.count.cmp(&a.count));
    years.truncate(config.top_years);

    DateSummary {
        valid: dates.len(),
        missing,
        bin_width_days,
        histogram,
        years,
    }
}

/// Equal-width histogram over `dates` with `buckets` bins. A single distinct
/// date gets one bin of width one day; no dates give no bins.
fn date_histogram(dates: &[NaiveDate], buckets: usize) -> (f64, Vec<DateBucket>) {
    let days: Vec<i64> = dates.iter().map(|d| epoch_days(*d)).collect();
    let (Some(&min), Some(&max)) = (days.iter().min(), days.iter().max()) else {
        return (0.0, Vec::new());
    };
    let buckets = buckets.max(1);

    if min == max {
        let start = from_epoch_days(min).map_or_else(Vec::new, |start| {
            vec![DateBucket {
                start,
                count: days.len(),
            }]
        });
        return (1.0, start);
    }

    let width = (max - min) as f64 / buckets as f64;
    let mut counts = vec![0usize; buckets];
    for d in &days {
        let idx = (((d - min) as f64 / width).floor() as usize).min(buckets - 1);
        if let Some(slot) = counts.get_mut(idx) {
            *slot += 1;
        }
    }

    let histogram = counts
        .into_iter()
        .enumerate()
        .filter_map(|(i, count)| {
            let start = from_epoch_days(min + (i as f64 * width).floor() as i64)?;
            Some(DateBucket { start, count })
        })
        .collect();
    (width, histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn categorical_counts_include_missing() {
        let col = Column::new(
            "Sexo",
            vec![text("M"), text("F"), text("F"), text("M"), text("F"), CellValue::Null],
        );
        let summary = summarize_categorical(&col, &EngineConfig::default());
        let pairs: Vec<(String, usize)> = summary
            .counts
            .iter()
            .map(|c| (c.value.to_string(), c.count))
            .collect();
        assert_eq!(
            pairs,
            vec![("F".to_string(), 3), ("M".to_string(), 2), ("<NA>".to_string(), 1)]
        );
        assert_eq!(summary.chart.kind, ChartKind::Pie);
        assert_eq!(summary.chart.entries.len(), 3);
    }

    #[test]
    fn categorical_top_and_bar_chart() {
        // 25 categories, category i appears i+1 times.
        let values = (0..25)
            .flat_map(|i| std::iter::repeat(text(&format!("c{i:02}"))).take(i + 1))
            .collect();
        let summary = summarize_categorical(&Column::new("Jaula", values), &EngineConfig::default());
        assert_eq!(summary.counts.len(), 25);
        assert_eq!(summary.top.len(), 5);
        assert_eq!(summary.top[0].value, text("c24"));
        assert_eq!(summary.top[0].count, 25);
        assert_eq!(summary.chart.kind, ChartKind::Bar);
        assert_eq!(summary.chart.entries.len(), 20);
    }

    #[test]
    fn chart_switches_to_bar_above_ten_categories() {
        let column = |n: usize| {
            Column::new("Cepa", (0..n).map(|i| text(&format!("s{i:02}"))).collect())
        };
        let config = EngineConfig::default();

        let ten = summarize_categorical(&column(10), &config);
        assert_eq!(ten.chart.kind, ChartKind::Pie);
        assert_eq!(ten.chart.entries.len(), 10);

        let eleven = summarize_categorical(&column(11), &config);
        assert_eq!(eleven.chart.kind, ChartKind::Bar);
        assert_eq!(eleven.chart.entries.len(), 11);
    }

    #[test]
    fn ties_break_by_value() {
        let col = Column::new("x", vec![text("b"), text("a"), text("c"), text("a"), text("b")]);
        let summary = summarize_categorical(&col, &EngineConfig::default());
        let order: Vec<String> = summary.counts.iter().map(|c| c.value.to_string()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn numeric_statistics() {
        let col = Column::new(
            "Edad (días)",
            vec![
                CellValue::Integer(10),
                CellValue::Null,
                CellValue::Integer(40),
                CellValue::Float(20.0),
                CellValue::Integer(30),
            ],
        );
        let summary = summarize_numeric(&col);
        assert_eq!(summary.min, Stat::Value(10.0));
        assert_eq!(summary.max, Stat::Value(40.0));
        assert_eq!(summary.mean, Stat::Value(25.0));
        assert_eq!(summary.median, Stat::Value(25.0));
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.values, vec![10.0, 40.0, 20.0, 30.0]);
    }

    #[test]
    fn numeric_all_missing_reports_na() {
        let col = Column::new("Edad (días)", vec![CellValue::Null; 3]);
        let summary = summarize_numeric(&col);
        assert_eq!(summary.min, Stat::NotAvailable);
        assert_eq!(summary.mean.to_string(), "NA");
        assert_eq!(summary.median, Stat::NotAvailable);
        assert_eq!(summary.max, Stat::NotAvailable);
        assert_eq!(summary.missing, 3);
        assert!(summary.values.is_empty());
        assert_eq!(serde_json::to_string(&summary.min).unwrap(), "\"NA\"");
    }

    #[test]
    fn stat_display_rounds_to_two_places() {
        assert_eq!(Stat::Value(2.0 / 3.0).to_string(), "0.67");
    }

    #[test]
    fn date_summary_buckets_and_years() {
        let mut values: Vec<CellValue> = (0..60)
            .map(|i| CellValue::Date(ymd(2018, 1, 1) + chrono::Duration::days(i * 30)))
            .collect();
        values.push(text("no es fecha"));
        values.push(CellValue::Null);
        let col = Column::new("F. nacimiento", values);

        let summary = summarize_dates(&col, &EngineConfig::default());
        assert_eq!(summary.valid, 60);
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.histogram.len(), 30);
        assert_eq!(summary.histogram.iter().map(|b| b.count).sum::<usize>(), 60);
        assert_eq!(summary.histogram[0].start, ymd(2018, 1, 1));
        assert_eq!(summary.years.len(), 5);
        let total_in_top: usize = summary.years.iter().map(|y| y.count).sum();
        assert!(total_in_top <= 60);
        assert!(summary.years.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn date_summary_edge_cases() {
        let none = summarize_dates(&Column::new("d", vec![CellValue::Null]), &EngineConfig::default());
        assert!(none.histogram.is_empty());
        assert!(none.years.is_empty());
        assert_eq!(none.missing, 1);

        let single = summarize_dates(
            &Column::new("d", vec![text("2020-01-01"), text("2020-01-01")]),
            &EngineConfig::default(),
        );
        assert_eq!(single.histogram, vec![DateBucket { start: ymd(2020, 1, 1), count: 2 }]);
        assert_eq!(single.years, vec![YearCount { year: 2020, count: 2 }]);
    }

    #[test]
    fn summarize_follows_key_order_and_skips_absent() {
        let table = Table::new(vec![
            Column::new("Sexo", vec![text("M"), text("F")]),
            Column::new("Edad (días)", vec![CellValue::Integer(1), CellValue::Integer(2)]),
        ])
        .unwrap();
        let keys = KeyColumns::new([
            ("Edad (días)", KeyKind::Numeric),
            ("Linea", KeyKind::Categorical),
            ("Sexo", KeyKind::Categorical),
        ]);
        let reports = summarize(&table, &keys, &EngineConfig::default());
        let names: Vec<&str> = reports.iter().map(|r| r.column.as_str()).collect();
        assert_eq!(names, vec!["Edad (días)", "Sexo"]);
    }

    #[test]
    fn key_columns_from_json_accept_short_kinds() {
        let keys: KeyColumns = serde_json::from_str(
            r#"[{"name": "Sexo", "kind": "cat"}, {"name": "Edad", "kind": "numeric"}]"#,
        )
        .unwrap();
        assert_eq!(keys.0[0].kind, KeyKind::Categorical);
        assert_eq!(keys.0[1].kind, KeyKind::Numeric);
    }
}
