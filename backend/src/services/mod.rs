//! Analytics engine.
//!
//! The services sit between the loaded dataset and the outer surfaces. A
//! dataset is expanded once into weighted units; every filter change then
//! runs a full pass (filter, bucketize, statistics, grouping) over the cached
//! expansion.

pub mod buckets;
pub mod expansion;
pub mod filtering;
pub mod grouping;
pub mod report;
pub mod session;
pub mod statistics;

pub use buckets::{bucket, build_histogram, order_buckets, DurationBucket, Histogram, HistogramSeries};
pub use expansion::{expand, Expansion, Units, ValueCounts};
pub use filtering::{allowed_values, compose, enforce_threshold, FilterPlan, FilteredUnits, Inclusion};
pub use grouping::{build_comparison, ComparisonTable, DurationClass, GroupSummary};
pub use report::{
    compute_report, filter_options, stat_markers, AnalyticsReport, DimensionOptions, FilterOptions,
    KpiSummary, StatMarker,
};
pub use session::{guarded, AnalyticsSession};
pub use statistics::{compute_statistics, quantile_sorted, SessionStatistics, WeightedSample};
