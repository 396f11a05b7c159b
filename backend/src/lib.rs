//! # Session Analytics Backend
//!
//! Session reconstruction and duration distribution analytics over aggregated
//! visit exports.
//!
//! Input tables carry one row per combination of dimension values, with a
//! visit duration and a weight telling how many individual visits the row
//! stands for. The engine replays each row `weight` times, filters the
//! reconstructed visits, and derives a bucketed duration histogram,
//! descriptive statistics and a per-group comparison table.
//!
//! ## Features
//!
//! - **Data Loading**: CSV and JSON tables validated against a schema descriptor
//! - **Expansion**: lazy weighted replay, cached once per loaded table
//! - **Filtering**: per-dimension selections plus a volume threshold toggle
//!   that always takes precedence on the reporting dimension
//! - **Analysis**: quartiles, mean, rebound rate, duration buckets and
//!   duration class shares per reporting value
//! - **HTTP API**: RESTful endpoints for a dashboard frontend
//!
//! ## Architecture
//!
//! - [`models`]: records, datasets and filter state
//! - [`io`]: schema descriptor and table loaders
//! - [`services`]: the analytics engine
//! - [`db`]: dataset repository and checksum deduplication
//! - [`config`]: TOML configuration
//! - [`api`]: Data Transfer Objects shared by the outer surfaces
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ProcessingError, ProcessingResult};
