//! High-level dataset service layer.
//!
//! Repository-agnostic operations used by the HTTP layer and by embedding
//! applications: upload with checksum deduplication, and report or filter
//! option computation on a stored dataset.
//!
//! # Usage
//!
//! ```no_run
//! use session_analytics::api::SourceFormat;
//! use session_analytics::db::{services, repositories::LocalRepository};
//! use session_analytics::io::{DatasetLoader, SchemaDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let loader = DatasetLoader::new(SchemaDescriptor::default());
//!     let content = "duration,weight,source,campaign,operator\n12,3,Google,Spring,A\n";
//!     let outcome = services::upload_dataset(&repo, &loader, "march", content, SourceFormat::Csv).await?;
//!     println!("Stored dataset {}", outcome.info.id);
//!     Ok(())
//! }
//! ```

use log::info;
use std::sync::Arc;

use super::checksum::calculate_checksum;
use super::repository::{DatasetRepository, RepositoryError, RepositoryResult};
use crate::api::{DatasetId, DatasetInfo, SourceFormat};
use crate::error::ProcessingError;
use crate::io::{DatasetLoader, LoadError};
use crate::models::FilterState;
use crate::services::{compute_report, filter_options, guarded, AnalyticsReport, Expansion, FilterOptions};

/// Errors raised while uploading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors raised while computing on a stored dataset.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of an upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub info: DatasetInfo,
    /// False when identical content was already stored
    pub created: bool,
}

/// Check if the store is healthy.
pub async fn health_check(repo: &dyn DatasetRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Load, expand and store `content`, reusing an existing dataset when the
/// same content was already uploaded with the same descriptor.
///
/// Loading and expansion run inside [`guarded`]; a fault there is returned as
/// [`ProcessingError::Unexpected`] and nothing is stored.
pub async fn upload_dataset(
    repo: &dyn DatasetRepository,
    loader: &DatasetLoader,
    name: &str,
    content: impl AsRef<[u8]>,
    format: SourceFormat,
) -> Result<UploadOutcome, UploadError> {
    let content = content.as_ref();
    let checksum = calculate_checksum(content);
    if let Some(existing) = repo.find_by_checksum(&checksum, loader.schema()).await? {
        info!(
            "Dataset '{}' matches stored dataset {} (checksum {}), reusing its expansion",
            name, existing.id, checksum
        );
        return Ok(UploadOutcome {
            info: existing,
            created: false,
        });
    }

    let loaded = guarded(|| {
        Ok(loader
            .load_bytes(content, format)
            .map(|dataset| Arc::new(Expansion::from(dataset))))
    })?;
    let expansion = loaded?;
    let info = repo
        .store_dataset(name, &checksum, loader.schema(), expansion)
        .await?;

    info!(
        "Stored dataset {} '{}' ({} rows, {} units, checksum {})",
        info.id, info.name, info.rows, info.total_units, info.checksum
    );
    Ok(UploadOutcome {
        info,
        created: true,
    })
}

pub async fn list_datasets(repo: &dyn DatasetRepository) -> RepositoryResult<Vec<DatasetInfo>> {
    repo.list_datasets().await
}

pub async fn get_dataset(repo: &dyn DatasetRepository, id: DatasetId) -> RepositoryResult<DatasetInfo> {
    repo.get_dataset(id).await
}

pub async fn delete_dataset(repo: &dyn DatasetRepository, id: DatasetId) -> RepositoryResult<()> {
    repo.delete_dataset(id).await?;
    info!("Deleted dataset {}", id);
    Ok(())
}

/// Compute the report for `state` on a stored dataset.
///
/// A fault inside the computation is captured and returned as
/// [`ProcessingError::Unexpected`]; the stored expansion is never modified.
pub async fn get_report(
    repo: &dyn DatasetRepository,
    id: DatasetId,
    state: &FilterState,
) -> Result<AnalyticsReport, AnalyticsError> {
    let expansion = repo.get_expansion(id).await?;
    Ok(guarded(|| compute_report(&expansion, state))?)
}

/// Filter widget options for `state` on a stored dataset.
pub async fn get_filter_options(
    repo: &dyn DatasetRepository,
    id: DatasetId,
    state: &FilterState,
) -> Result<FilterOptions, AnalyticsError> {
    let expansion = repo.get_expansion(id).await?;
    Ok(guarded(|| Ok(filter_options(&expansion, state)))?)
}
