//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.body_limit_bytes();

    let api_v1 = Router::new()
        // Dataset CRUD
        .route(
            "/datasets",
            get(handlers::list_datasets).post(handlers::create_dataset),
        )
        .route("/datasets/raw", post(handlers::create_dataset_raw))
        .route(
            "/datasets/{dataset_id}",
            get(handlers::get_dataset).delete(handlers::delete_dataset),
        )
        // Analytics
        .route(
            "/datasets/{dataset_id}/report",
            get(handlers::get_default_report).post(handlers::get_report),
        )
        .route(
            "/datasets/{dataset_id}/options",
            post(handlers::get_filter_options),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Uploads carry the whole table inline.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
