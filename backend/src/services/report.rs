//! One full recomputation pass: filter, then histogram, statistics and
//! comparison table from the same filtered units.

use serde::Serialize;
use std::collections::BTreeMap;

use super::buckets::{build_histogram, DurationBucket, Histogram};
use super::expansion::Expansion;
use super::filtering::{allowed_values, FilterPlan};
use super::grouping::{build_comparison, GroupSummary};
use super::statistics::{compute_statistics, SessionStatistics};
use crate::error::ProcessingResult;
use crate::models::FilterState;

/// Reference marker for one statistic on the histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatMarker {
    pub name: &'static str,
    pub value: f64,
    pub bucket: DurationBucket,
}

/// Session count, rebound rate and median, as shown in the KPI row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub sessions: u64,
    pub rebound_rate: f64,
    pub median: f64,
}

/// Everything the presentation layer needs for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub reporting_dimension: String,
    pub kpi: KpiSummary,
    pub statistics: SessionStatistics,
    pub markers: Vec<StatMarker>,
    pub histogram: Histogram,
    pub comparison: Vec<GroupSummary>,
    pub max_volume: u64,
}

impl AnalyticsReport {
    pub fn is_empty(&self) -> bool {
        self.statistics.count == 0
    }
}

/// Markers for Q1, median, Q3 and mean, each placed on its bucket.
pub fn stat_markers(stats: &SessionStatistics) -> Vec<StatMarker> {
    [
        ("Q1", stats.q1),
        ("MED", stats.median),
        ("Q3", stats.q3),
        ("MOY", stats.mean),
    ]
    .into_iter()
    .map(|(name, value)| StatMarker {
        name,
        value,
        bucket: DurationBucket::of(value),
    })
    .collect()
}

/// Recompute every output for `state` from the cached expansion.
pub fn compute_report(expansion: &Expansion, state: &FilterState) -> ProcessingResult<AnalyticsReport> {
    let plan = FilterPlan::build(expansion, state)?;
    let filtered = plan.apply(expansion);

    let statistics = compute_statistics(&filtered, state.mode);
    let histogram = build_histogram(&filtered);
    let comparison = build_comparison(&filtered);

    log::debug!(
        "Report computed: {} of {} units kept, {} groups, {} buckets",
        statistics.count,
        expansion.total_units(),
        comparison.groups.len(),
        histogram.buckets.len()
    );

    Ok(AnalyticsReport {
        reporting_dimension: expansion.dataset().reporting_dimension().to_string(),
        kpi: KpiSummary {
            sessions: statistics.count,
            rebound_rate: statistics.rebound_rate,
            median: statistics.median,
        },
        markers: stat_markers(&statistics),
        statistics,
        histogram,
        max_volume: comparison.max_volume(),
        comparison: comparison.groups,
    })
}

/// Selectable values of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionOptions {
    pub dimension: String,
    pub reporting: bool,
    pub values: Vec<String>,
}

/// Values a filter widget can offer, per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub dimensions: Vec<DimensionOptions>,
}

impl FilterOptions {
    pub fn values(&self, dimension: &str) -> Option<&[String]> {
        self.dimensions
            .iter()
            .find(|d| d.dimension == dimension)
            .map(|d| d.values.as_slice())
    }
}

/// Sorted distinct values per dimension; the reporting dimension only offers
/// values the threshold toggle allows.
pub fn filter_options(expansion: &Expansion, state: &FilterState) -> FilterOptions {
    let dataset = expansion.dataset();
    let dimensions = dataset
        .dimensions
        .iter()
        .enumerate()
        .map(|(dim, name)| {
            let counts = expansion.value_counts(dim);
            let reporting = dim == dataset.reporting;
            let values = if reporting {
                allowed_values(counts, state.threshold.enabled, state.threshold.min_volume)
                    .into_iter()
                    .collect()
            } else {
                counts.keys().cloned().collect()
            };
            DimensionOptions {
                dimension: name.clone(),
                reporting,
                values,
            }
        })
        .collect();
    FilterOptions { dimensions }
}

/// Unfiltered unit count per reporting value.
pub fn reporting_volumes(expansion: &Expansion) -> BTreeMap<String, u64> {
    expansion.reporting_counts().clone()
}
