//! Repository trait definitions for dataset storage.
//!
//! - [`error`]: Error types for repository operations
//! - [`dataset`]: Storage of datasets and their cached expansions

pub mod dataset;
pub mod error;

pub use dataset::DatasetRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
