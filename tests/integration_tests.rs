use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sheet_catalog::app;
use sheet_catalog::config::HttpConfig;
use sheet_catalog::infrastructure::sheet::{
    CellValue, JsonFileSheetStore, MemorySheetStore, SheetRange, SheetStore, StoreError,
};
use sheet_catalog::{AppState, CatalogService};
use tower::ServiceExt;

const SHEET: &str = "Sheet1";

fn header() -> Vec<CellValue> {
    ["id", "name", "price", "duration", "unit", "note", "updateAT", "category", "comboProducts"]
        .iter()
        .map(|h| CellValue::text(*h))
        .collect()
}

fn build_app(store: Arc<dyn SheetStore>) -> Router {
    build_app_with(store, &HttpConfig::default())
}

fn build_app_with(store: Arc<dyn SheetStore>, http: &HttpConfig) -> Router {
    let catalog = CatalogService::new(store, SHEET);
    app::router(AppState { catalog }, http)
}

fn memory_app() -> (Router, Arc<MemorySheetStore>) {
    let store = Arc::new(MemorySheetStore::new().with_sheet(SHEET, vec![header()]));
    (build_app(store.clone()), store)
}

async fn send(app: &Router, request: Request<Body>) -> Value {
    let response = app.clone().oneshot(request).await.unwrap();

    // 所有响应都是 200 + JSON
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{}", content_type);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router) -> Value {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, body: impl Into<String>) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    send(app, request).await
}

fn sample_products() -> Value {
    json!([
        {
            "id": "test-001",
            "name": "Test Product",
            "price": 100000,
            "duration": 1,
            "unit": "tháng",
            "note": "Test note",
            "updateAT": "2024-06-01T09:30:00.000Z",
            "category": "AI Services",
            "comboProducts": ""
        },
        {
            "id": "test-combo-001",
            "name": "Test Combo",
            "price": 300000,
            "duration": 1,
            "unit": "tháng",
            "note": "Test combo",
            "updateAT": "2024-06-01T09:30:00.000Z",
            "category": "Combo",
            "comboProducts": "test-001,test-002"
        }
    ])
}

#[tokio::test]
async fn test_get_on_empty_sheet() {
    let (app, _) = memory_app();
    assert_eq!(get(&app).await, json!({ "success": true, "data": [] }));
}

#[tokio::test]
async fn test_upsert_then_get_returns_same_products() {
    let (app, _) = memory_app();

    let response = post(
        &app,
        json!({ "action": "upsert", "products": sample_products() }).to_string(),
    )
    .await;
    assert_eq!(
        response,
        json!({ "success": true, "message": "Data saved successfully", "rowsAffected": 2 })
    );

    let listed = get(&app).await;
    assert_eq!(listed, json!({ "success": true, "data": sample_products() }));
}

#[tokio::test]
async fn test_upsert_replaces_previous_products() {
    let (app, _) = memory_app();
    post(
        &app,
        json!({ "action": "upsert", "products": sample_products() }).to_string(),
    )
    .await;

    post(
        &app,
        json!({ "action": "upsert", "products": [{ "id": "only", "name": "Only" }] }).to_string(),
    )
    .await;

    let data = get(&app).await["data"].clone();
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], "only");
    assert_eq!(data[0]["price"], 0);
    assert_eq!(data[0]["duration"], 1);
    assert_eq!(data[0]["unit"], "month");
    assert_eq!(data[0]["category"], "AI Services");
    assert!(!data[0]["updateAT"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_alias_category_via_http() {
    let (app, _) = memory_app();
    post(
        &app,
        json!({
            "action": "upsert",
            "products": [{ "id": "c1", "name": "Combo", "H": "Combo", "comboProducts": "a,b" }]
        })
        .to_string(),
    )
    .await;

    let data = get(&app).await["data"].clone();
    assert_eq!(data[0]["category"], "Combo");
    assert_eq!(data[0]["comboProducts"], "a,b");
}

#[tokio::test]
async fn test_delete_via_http() {
    let (app, _) = memory_app();
    let products = json!([
        { "id": "a", "name": "A" },
        { "id": "b", "name": "B" },
        { "id": "c", "name": "C" }
    ]);
    post(&app, json!({ "action": "upsert", "products": products }).to_string()).await;

    let response = post(&app, json!({ "action": "delete", "ids": ["a", "c"] }).to_string()).await;
    assert_eq!(
        response,
        json!({ "success": true, "message": "Products deleted successfully", "rowsAffected": 2 })
    );

    let data = get(&app).await["data"].clone();
    let ids: Vec<&str> = data
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b"]);
}

#[tokio::test]
async fn test_delete_with_empty_ids_leaves_table() {
    let (app, store) = memory_app();
    post(
        &app,
        json!({ "action": "upsert", "products": sample_products() }).to_string(),
    )
    .await;
    let before = store.snapshot(SHEET).await;

    let response = post(&app, json!({ "action": "delete", "ids": [] }).to_string()).await;
    assert_eq!(
        response,
        json!({ "success": false, "message": "No IDs provided for deletion" })
    );
    assert_eq!(store.snapshot(SHEET).await, before);
}

#[tokio::test]
async fn test_malformed_json_leaves_table() {
    let (app, store) = memory_app();
    post(
        &app,
        json!({ "action": "upsert", "products": sample_products() }).to_string(),
    )
    .await;
    let before = store.snapshot(SHEET).await;

    let response = post(&app, "{\"action\": \"upsert\", ").await;
    assert_eq!(
        response,
        json!({ "success": false, "message": "Invalid JSON format" })
    );
    assert_eq!(store.snapshot(SHEET).await, before);
}

#[tokio::test]
async fn test_unknown_action() {
    let (app, _) = memory_app();

    let response = post(&app, json!({ "action": "purge" }).to_string()).await;
    assert_eq!(
        response,
        json!({ "success": false, "message": "Unknown action: purge" })
    );

    let response = post(&app, json!({ "ids": ["a"] }).to_string()).await;
    assert_eq!(response["message"], "Unknown action: undefined");
}

#[tokio::test]
async fn test_missing_sheet_is_reported() {
    let app = build_app(Arc::new(MemorySheetStore::new()));

    assert_eq!(
        get(&app).await,
        json!({ "success": false, "message": "Sheet not found: Sheet1" })
    );
    assert_eq!(
        post(&app, json!({ "action": "upsert", "products": [] }).to_string()).await,
        json!({ "success": false, "message": "Upsert failed: Sheet not found: Sheet1" })
    );
    assert_eq!(
        post(&app, json!({ "action": "delete", "ids": ["a"] }).to_string()).await,
        json!({ "success": false, "message": "Delete failed: Sheet not found: Sheet1" })
    );
}

/// 读取时 panic 的存储，用于验证顶层兜底
struct PanickingStore;

#[async_trait]
impl SheetStore for PanickingStore {
    async fn read_all(&self, _sheet: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        panic!("storage exploded")
    }

    async fn clear_range(&self, _sheet: &str, _range: SheetRange) -> Result<(), StoreError> {
        Ok(())
    }

    async fn write_range(
        &self,
        _sheet: &str,
        _row: usize,
        _column: usize,
        _values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete_row(&self, _sheet: &str, _row: usize) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_panic_becomes_server_error() {
    let app = build_app(Arc::new(PanickingStore));

    assert_eq!(
        get(&app).await,
        json!({ "success": false, "message": "Server error: storage exploded" })
    );

    // 上一个请求 panic 后服务仍可用
    let response = post(&app, json!({ "action": "nope" }).to_string()).await;
    assert_eq!(response["message"], "Unknown action: nope");
}

#[tokio::test]
async fn test_panic_response_keeps_cors_and_request_id() {
    let app = build_app(Arc::new(PanickingStore));
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "https://shop.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_oversized_body_returns_envelope() {
    let store = Arc::new(MemorySheetStore::new().with_sheet(SHEET, vec![header()]));
    let http = HttpConfig {
        max_body_bytes: 1024,
        ..HttpConfig::default()
    };
    let app = build_app_with(store.clone(), &http);
    post(
        &app,
        json!({ "action": "upsert", "products": sample_products() }).to_string(),
    )
    .await;
    let before = store.snapshot(SHEET).await;

    let products: Vec<Value> = (0..100)
        .map(|n| json!({ "id": format!("p-{}", n), "name": format!("Product {}", n) }))
        .collect();
    let response = post(
        &app,
        json!({ "action": "upsert", "products": products }).to_string(),
    )
    .await;

    assert_eq!(response["success"], false);
    let message = response["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid request body:"), "{}", message);
    assert!(message.contains("length limit exceeded"), "{}", message);
    assert_eq!(store.snapshot(SHEET).await, before);
}

#[tokio::test]
async fn test_large_catalog_fits_default_limit() {
    let (app, _) = memory_app();
    let products: Vec<Value> = (0..20_000)
        .map(|n| {
            json!({
                "id": format!("product-{:05}", n),
                "name": format!("Product number {}", n),
                "note": "x".repeat(80)
            })
        })
        .collect();
    let body = json!({ "action": "upsert", "products": products }).to_string();
    assert!(body.len() > 2 * 1024 * 1024);

    let response = post(&app, body).await;
    assert_eq!(response["success"], true);
    assert_eq!(response["rowsAffected"], 20_000);
    assert_eq!(get(&app).await["data"].as_array().unwrap().len(), 20_000);
}

#[tokio::test]
async fn test_unparseable_values_fall_back_to_defaults() {
    let (app, _) = memory_app();
    let response = post(
        &app,
        json!({
            "action": "upsert",
            "products": [
                { "id": "a", "name": "A", "price": "abc", "note": { "x": 1 } },
                { "id": "b", "name": "B", "price": 5 }
            ]
        })
        .to_string(),
    )
    .await;
    assert_eq!(response["success"], true);
    assert_eq!(response["rowsAffected"], 2);

    let data = get(&app).await["data"].clone();
    assert_eq!(data[0]["price"], 0);
    assert_eq!(data[0]["note"], r#"{"x":1}"#);
    assert_eq!(data[1]["price"], 5);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let (app, _) = memory_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    {
        let store = JsonFileSheetStore::open(&path, SHEET, header()).await.unwrap();
        let app = build_app(Arc::new(store));
        post(
            &app,
            json!({ "action": "upsert", "products": sample_products() }).to_string(),
        )
        .await;
    }

    let store = JsonFileSheetStore::open(&path, SHEET, header()).await.unwrap();
    let app = build_app(Arc::new(store));
    assert_eq!(get(&app).await, json!({ "success": true, "data": sample_products() }));
}
