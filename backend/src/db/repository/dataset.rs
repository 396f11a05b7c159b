//! Dataset repository trait.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::RepositoryResult;
use crate::api::{DatasetId, DatasetInfo, SchemaDescriptor};
use crate::services::Expansion;

/// Storage for loaded datasets and their cached expansions.
///
/// The expansion is built once when a dataset is stored and shared by every
/// report computed on it afterwards.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Check that the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store an expanded dataset and return its summary.
    ///
    /// # Arguments
    /// * `name` - Display name of the dataset
    /// * `checksum` - SHA-256 of the uploaded content
    /// * `schema` - Descriptor the content was loaded with
    /// * `expansion` - Expansion built from the loaded dataset
    async fn store_dataset(
        &self,
        name: &str,
        checksum: &str,
        schema: &SchemaDescriptor,
        expansion: Arc<Expansion>,
    ) -> RepositoryResult<DatasetInfo>;

    /// Find a dataset previously stored from the same content and descriptor.
    async fn find_by_checksum(
        &self,
        checksum: &str,
        schema: &SchemaDescriptor,
    ) -> RepositoryResult<Option<DatasetInfo>>;

    async fn get_dataset(&self, id: DatasetId) -> RepositoryResult<DatasetInfo>;

    /// Cached expansion of a stored dataset.
    async fn get_expansion(&self, id: DatasetId) -> RepositoryResult<Arc<Expansion>>;

    /// All stored datasets, ordered by id.
    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>>;

    async fn delete_dataset(&self, id: DatasetId) -> RepositoryResult<()>;
}
