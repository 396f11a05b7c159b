//! In-memory local repository implementation.
//!
//! Datasets and their expansions live in a `BTreeMap` behind a
//! `parking_lot::RwLock`; nothing is persisted across restarts.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::{DatasetId, DatasetInfo, SchemaDescriptor};
use crate::db::repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::services::Expansion;

/// In-memory dataset store.
///
/// # Example
/// ```
/// use session_analytics::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.dataset_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct StoredDataset {
    info: DatasetInfo,
    expansion: Arc<Expansion>,
}

struct LocalData {
    datasets: BTreeMap<DatasetId, StoredDataset>,
    next_id: DatasetId,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            next_id: DatasetId(1),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Remove every dataset; ids keep counting from where they were.
    pub fn clear(&self) {
        self.data.write().datasets.clear();
    }

    pub fn dataset_count(&self) -> usize {
        self.data.read().datasets.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Store is not healthy"))
        }
    }

    fn missing(operation: &str, id: DatasetId) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("Dataset {} not found", id),
            ErrorContext::new(operation)
                .with_entity("dataset")
                .with_entity_id(id),
        )
    }
}

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_dataset(
        &self,
        name: &str,
        checksum: &str,
        schema: &SchemaDescriptor,
        expansion: Arc<Expansion>,
    ) -> RepositoryResult<DatasetInfo> {
        self.check_health()?;
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Dataset name must not be empty",
                ErrorContext::new("store_dataset").with_entity("dataset"),
            ));
        }

        let mut data = self.data.write();
        let id = data.next_id;
        data.next_id = DatasetId(id.value() + 1);

        let dataset = expansion.dataset();
        let info = DatasetInfo {
            id,
            name: name.to_string(),
            checksum: checksum.to_string(),
            rows: dataset.records.len(),
            total_units: expansion.total_units(),
            dimensions: dataset.dimensions.clone(),
            reporting_dimension: dataset.reporting_dimension().to_string(),
            coercions: dataset.coercions,
            schema: schema.clone(),
            uploaded_at: Utc::now(),
        };
        data.datasets.insert(
            id,
            StoredDataset {
                info: info.clone(),
                expansion,
            },
        );
        Ok(info)
    }

    async fn find_by_checksum(
        &self,
        checksum: &str,
        schema: &SchemaDescriptor,
    ) -> RepositoryResult<Option<DatasetInfo>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .datasets
            .values()
            .find(|stored| stored.info.checksum == checksum && stored.info.schema == *schema)
            .map(|stored| stored.info.clone()))
    }

    async fn get_dataset(&self, id: DatasetId) -> RepositoryResult<DatasetInfo> {
        self.check_health()?;
        self.data
            .read()
            .datasets
            .get(&id)
            .map(|stored| stored.info.clone())
            .ok_or_else(|| Self::missing("get_dataset", id))
    }

    async fn get_expansion(&self, id: DatasetId) -> RepositoryResult<Arc<Expansion>> {
        self.check_health()?;
        self.data
            .read()
            .datasets
            .get(&id)
            .map(|stored| Arc::clone(&stored.expansion))
            .ok_or_else(|| Self::missing("get_expansion", id))
    }

    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .datasets
            .values()
            .map(|stored| stored.info.clone())
            .collect())
    }

    async fn delete_dataset(&self, id: DatasetId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .datasets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::missing("delete_dataset", id))
    }
}
