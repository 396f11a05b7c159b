//! Input boundary: schema validation and table loaders.
//!
//! - [`schema`]: logical-field-to-column descriptor, validated once per load
//! - [`loaders`]: CSV, JSON and workbook loaders producing a [`crate::models::Dataset`]

pub mod loaders;
pub mod schema;

pub use loaders::{CsvOptions, DatasetLoader, LoadError, SourceFormat, DEFAULT_SHEET};
pub use schema::{FieldMapping, MissingField, ResolvedSchema, SchemaDescriptor, SchemaError};
