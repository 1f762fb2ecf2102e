//! Tunable thresholds of the filter and summary engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Columns with at most this many distinct values become multi-selects.
pub const CATEGORICAL_THRESHOLD: usize = 30;
/// Number of buckets in a date histogram.
pub const HISTOGRAM_BUCKETS: usize = 30;
/// Rows surfaced from a categorical frequency table.
pub const TOP_CATEGORIES: usize = 5;
/// Up to this many categories are charted whole (pie), above it as a bar.
pub const PIE_CHART_MAX_CATEGORIES: usize = 10;
/// Categories kept for a bar chart.
pub const BAR_CHART_TOP: usize = 20;
/// Rows surfaced from the per-year date table.
pub const TOP_YEARS: usize = 5;

/// Date layouts tried, in order, when coercing text to dates.
pub fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Engine configuration. Every field has a default, so a partial JSON file
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub categorical_threshold: usize,
    pub histogram_buckets: usize,
    pub top_categories: usize,
    pub pie_chart_max_categories: usize,
    pub bar_chart_top: usize,
    pub top_years: usize,
    pub date_formats: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: CATEGORICAL_THRESHOLD,
            histogram_buckets: HISTOGRAM_BUCKETS,
            top_categories: TOP_CATEGORIES,
            pie_chart_max_categories: PIE_CHART_MAX_CATEGORIES,
            bar_chart_top: BAR_CHART_TOP,
            top_years: TOP_YEARS,
            date_formats: default_date_formats(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ExplorerError> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        if config.histogram_buckets == 0 {
            return Err(ExplorerError::Config(
                "histogram_buckets must be at least 1".to_string(),
            ));
        }
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}
