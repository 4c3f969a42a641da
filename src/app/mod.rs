//! 应用层

pub mod catalog;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::HttpConfig;
use crate::core::{error::CoreError, middleware::request_logging_middleware};
use catalog::{
    handler::{dispatch_command, list_products},
    AppState,
};

pub const HEALTH_PATH: &str = "/health";

/// 创建路由：`endpoint` 上 GET 列表、POST 命令，另有健康检查
///
/// panic 兜底在最内层，兜底响应同样带有请求 id 和跨域头。
pub fn router(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route(&http.endpoint, get(list_products).post(dispatch_command))
        .route(HEALTH_PATH, get(health_check))
        .layer(DefaultBodyLimit::max(http.max_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&http.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // 未配置来源时允许任意来源
        return CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin);
    }

    let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

/// 处理器 panic 时仍返回统一的失败响应
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let description = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    CoreError::Internal(description).into_response()
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
