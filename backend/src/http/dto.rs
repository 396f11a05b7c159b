//! Data Transfer Objects for the HTTP API.
//!
//! Report and dataset DTOs are re-exported from [`crate::api`]; this module
//! only adds request bodies and response envelopes.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    AnalyticsReport, DatasetId, DatasetInfo, FilterOptions, FilterState, SchemaDescriptor,
    SourceFormat,
};
use crate::config::MarkerPalette;

/// Schema to load an upload with: a preset name or a full descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaChoice {
    Preset(String),
    Custom(SchemaDescriptor),
}

impl SchemaChoice {
    pub fn descriptor(&self) -> Result<SchemaDescriptor, String> {
        match self {
            SchemaChoice::Preset(name) => SchemaDescriptor::preset(name)
                .ok_or_else(|| format!("Unknown schema preset '{}'", name)),
            SchemaChoice::Custom(descriptor) => Ok(descriptor.clone()),
        }
    }
}

/// Request body for uploading a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetRequest {
    /// Name for the dataset
    pub name: String,
    pub format: SourceFormat,
    /// Raw table content (CSV text or a JSON array of row objects)
    pub content: String,
    /// Overrides the configured schema for this upload
    #[serde(default)]
    pub schema: Option<SchemaChoice>,
}

/// Query parameters for a raw-body upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUploadParams {
    pub name: String,
    pub format: SourceFormat,
    /// Schema preset name; the configured schema when absent
    #[serde(default)]
    pub schema: Option<String>,
}

/// Response for dataset upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetResponse {
    pub dataset: DatasetInfo,
    /// False when identical content was already stored
    pub created: bool,
}

/// Dataset list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<DatasetInfo>,
    /// Total count
    pub total: usize,
}

/// Report plus the marker styles the presentation layer should draw with.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub filter: FilterState,
    #[serde(flatten)]
    pub report: AnalyticsReport,
    pub marker_styles: MarkerPalette,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Dataset store status
    pub store: String,
}
