//! Public API surface of the analytics backend.
//!
//! This file consolidates the types that cross the crate boundary: dataset
//! identifiers and summaries, and the report DTOs produced by the services.
//! All types derive Serialize for JSON serialization.

pub use crate::io::{FieldMapping, MissingField, SchemaDescriptor, SourceFormat};
pub use crate::models::{CalculationMode, CoercionReport, FilterState, ThresholdToggle};
pub use crate::services::buckets::{DurationBucket, Histogram, HistogramSeries};
pub use crate::services::grouping::{DurationClass, GroupSummary};
pub use crate::services::report::{
    AnalyticsReport, DimensionOptions, FilterOptions, KpiSummary, StatMarker,
};
pub use crate::services::statistics::SessionStatistics;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, DatasetId);

/// Lightweight description of a stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: DatasetId,
    pub name: String,
    /// SHA-256 of the uploaded content
    pub checksum: String,
    pub rows: usize,
    pub total_units: u64,
    pub dimensions: Vec<String>,
    pub reporting_dimension: String,
    pub coercions: CoercionReport,
    /// Descriptor the content was loaded with
    pub schema: SchemaDescriptor,
    pub uploaded_at: DateTime<Utc>,
}
