//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer. Report computation runs on a blocking thread.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::dto::{
    CreateDatasetRequest, CreateDatasetResponse, DatasetListResponse, HealthResponse,
    RawUploadParams, ReportResponse, SchemaChoice,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{DatasetId, DatasetInfo, FilterOptions, FilterState};
use crate::db::services as db_services;
use crate::io::{DatasetLoader, SourceFormat};
use crate::services::{compute_report, filter_options, guarded, Expansion};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let store_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "available".to_string(),
        Ok(false) => "unavailable".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        store: store_status,
    }))
}

// =============================================================================
// Dataset CRUD
// =============================================================================

/// GET /v1/datasets
pub async fn list_datasets(State(state): State<AppState>) -> HandlerResult<DatasetListResponse> {
    let datasets = db_services::list_datasets(state.repository.as_ref()).await?;
    let total = datasets.len();
    Ok(Json(DatasetListResponse { datasets, total }))
}

/// Loader for an upload: the request's schema when given, else the configured one.
fn loader_for(state: &AppState, schema: Option<&SchemaChoice>) -> Result<DatasetLoader, AppError> {
    let loader = match schema {
        Some(choice) => {
            let descriptor = choice.descriptor().map_err(AppError::BadRequest)?;
            descriptor.check().map_err(AppError::Schema)?;
            DatasetLoader::new(descriptor)
                .with_csv_options(state.config.csv_options()?)
                .with_sheet(state.config.schema.sheet.clone())
        }
        None => state.config.loader()?,
    };
    Ok(loader)
}

async fn store_upload(
    state: &AppState,
    loader: &DatasetLoader,
    name: &str,
    content: &[u8],
    format: SourceFormat,
) -> Result<(StatusCode, Json<CreateDatasetResponse>), AppError> {
    let outcome =
        db_services::upload_dataset(state.repository.as_ref(), loader, name, content, format).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(CreateDatasetResponse {
            dataset: outcome.info,
            created: outcome.created,
        }),
    ))
}

/// POST /v1/datasets
///
/// Load, expand and store a table sent inline as text. Returns 201 for a new
/// dataset and 200 when identical content was already stored.
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(request): Json<CreateDatasetRequest>,
) -> Result<(StatusCode, Json<CreateDatasetResponse>), AppError> {
    if request.format == SourceFormat::Xlsx {
        return Err(AppError::BadRequest(
            "Workbooks must be sent as raw bytes to /v1/datasets/raw".to_string(),
        ));
    }
    let loader = loader_for(&state, request.schema.as_ref())?;
    store_upload(
        &state,
        &loader,
        &request.name,
        request.content.as_bytes(),
        request.format,
    )
    .await
}

/// POST /v1/datasets/raw?name=..&format=..&schema=..
///
/// Same as [`create_dataset`] for a table sent as the raw request body,
/// which is how workbooks are uploaded.
pub async fn create_dataset_raw(
    State(state): State<AppState>,
    Query(params): Query<RawUploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateDatasetResponse>), AppError> {
    let schema = params.schema.map(SchemaChoice::Preset);
    let loader = loader_for(&state, schema.as_ref())?;
    store_upload(&state, &loader, &params.name, &body, params.format).await
}

/// GET /v1/datasets/{dataset_id}
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> HandlerResult<DatasetInfo> {
    let info = db_services::get_dataset(state.repository.as_ref(), DatasetId::new(dataset_id)).await?;
    Ok(Json(info))
}

/// DELETE /v1/datasets/{dataset_id}
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db_services::delete_dataset(state.repository.as_ref(), DatasetId::new(dataset_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Analytics
// =============================================================================

async fn expansion(state: &AppState, dataset_id: i64) -> Result<Arc<Expansion>, AppError> {
    Ok(state
        .repository
        .get_expansion(DatasetId::new(dataset_id))
        .await?)
}

async fn report_for(
    state: &AppState,
    dataset_id: i64,
    filter: FilterState,
) -> HandlerResult<ReportResponse> {
    let expansion = expansion(state, dataset_id).await?;
    let marker_styles = state.config.presentation.markers.clone();

    let response = tokio::task::spawn_blocking(move || {
        guarded(|| compute_report(&expansion, &filter)).map(|report| ReportResponse {
            filter,
            report,
            marker_styles,
        })
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(response))
}

/// POST /v1/datasets/{dataset_id}/report
///
/// Recompute histogram, statistics and comparison table for a filter state.
pub async fn get_report(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
    Json(filter): Json<FilterState>,
) -> HandlerResult<ReportResponse> {
    report_for(&state, dataset_id, filter).await
}

/// GET /v1/datasets/{dataset_id}/report
///
/// Report for the configured default filter state.
pub async fn get_default_report(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> HandlerResult<ReportResponse> {
    let filter = state.config.default_filter_state();
    report_for(&state, dataset_id, filter).await
}

/// POST /v1/datasets/{dataset_id}/options
///
/// Values each filter widget can offer under a filter state.
pub async fn get_filter_options(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
    Json(filter): Json<FilterState>,
) -> HandlerResult<FilterOptions> {
    let expansion = expansion(&state, dataset_id).await?;
    let options = tokio::task::spawn_blocking(move || {
        guarded(|| Ok(filter_options(&expansion, &filter)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(Json(options))
}
