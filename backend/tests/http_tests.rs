//! HTTP API tests driven through the router with `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use session_analytics::config::AppConfig;
use session_analytics::db::repositories::LocalRepository;
use session_analytics::db::repository::DatasetRepository;
use session_analytics::http::{create_router, AppState};

use support::{SAMPLE_CSV, SAMPLE_LEGACY_CSV};

fn app_with(config: AppConfig) -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn DatasetRepository>;
    create_router(AppState::new(repo, config))
}

fn app() -> Router {
    app_with(AppConfig::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "march", "format": "csv", "content": SAMPLE_CSV })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["dataset"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn upload_then_reupload_is_deduplicated() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "copy", "format": "csv", "content": SAMPLE_CSV })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["dataset"]["id"], id);

    let (status, body) = send(&app, Method::GET, "/v1/datasets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["datasets"][0]["total_units"], 190);
}

#[tokio::test]
async fn upload_with_legacy_preset() {
    let mut config = AppConfig::default();
    config.schema.delimiter = ";".to_string();
    let app = app_with(config);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datasets",
        Some(json!({
            "name": "legacy",
            "format": "csv",
            "content": SAMPLE_LEGACY_CSV,
            "schema": "legacy_export",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["dataset"]["rows"], 8);
    assert_eq!(body["dataset"]["reporting_dimension"], "operator");
}

async fn send_raw(app: &Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn workbook_upload_as_raw_body() {
    let app = app();
    let workbook = std::fs::read(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy_export.xlsx"),
    )
    .unwrap();
    let uri = "/v1/datasets/raw?name=export&format=xlsx&schema=legacy_export";

    let (status, body) = send_raw(&app, uri, workbook.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["dataset"]["rows"], 8);
    assert_eq!(body["dataset"]["total_units"], 190);

    let (status, body) = send_raw(&app, uri, workbook).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
}

#[tokio::test]
async fn workbook_in_json_body_is_bad_request() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "book", "format": "xlsx", "content": "PK" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn overflowing_weights_are_bad_request() {
    let content = "duration,weight,source,campaign,operator\n10,1e19,G,S,A\n20,1e19,G,S,A\n";
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "huge", "format": "csv", "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("overflows"));
}

#[tokio::test]
async fn missing_columns_are_reported() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "broken", "format": "csv", "content": "duration,operator\n1,A\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SCHEMA_ERROR");
    assert_eq!(body["details"]["missing"], json!(["weight", "source", "campaign"]));
}

#[tokio::test]
async fn unknown_preset_is_bad_request() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "x", "format": "csv", "content": SAMPLE_CSV, "schema": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn report_with_threshold() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/report"),
        Some(json!({
            "selections": { "operator": ["A", "B"] },
            "threshold": { "enabled": true, "min_volume": 100 },
            "mode": "engagement-only",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["count"], 150);
    assert_eq!(body["comparison"].as_array().unwrap().len(), 1);
    assert_eq!(body["comparison"][0]["value"], "A");
    assert_eq!(body["filter"]["threshold"]["enabled"], true);
    assert_eq!(body["marker_styles"]["median"]["color"], "#e74c3c");
}

#[tokio::test]
async fn default_report_uses_configured_state() {
    let mut config = AppConfig::default();
    config.analytics.threshold_enabled = true;
    config.analytics.default_threshold = 100;
    let app = app_with(config);
    let id = upload(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/v1/datasets/{id}/report"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kpi"]["sessions"], 150);
    assert_eq!(body["reporting_dimension"], "operator");
}

#[tokio::test]
async fn unknown_dimension_is_bad_request() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/report"),
        Some(json!({ "selections": { "country": ["FR"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/report"),
        Some(json!({ "selections": { "country": [] } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["count"], 190);
}

#[tokio::test]
async fn filter_options_follow_threshold() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/options"),
        Some(json!({ "threshold": { "enabled": true, "min_volume": 100 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let operator = body["dimensions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["dimension"] == "operator")
        .unwrap();
    assert_eq!(operator["reporting"], true);
    assert_eq!(operator["values"], json!(["A"]));
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app();
    let id = upload(&app).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/datasets/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/v1/datasets/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::GET, &format!("/v1/datasets/{id}/report"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
