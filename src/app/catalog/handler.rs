//! 商品目录处理器

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
};
use tracing::info;

use super::{command::Command, model::Product, service::CatalogService};
use crate::core::{error::CoreError, response::ApiResponse};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

/// GET：列出全部商品，不接受查询参数
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Product>>, CoreError> {
    info!("收到 GET 请求，工作表: {}", state.catalog.sheet());
    state.catalog.list().await
}

/// POST：按 `action` 分发到 upsert / delete
///
/// 请求体自行解析，JSON 格式错误和超出大小上限也以统一的响应结构返回。
pub async fn dispatch_command(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<ApiResponse<()>, CoreError> {
    let body = body.map_err(|rejection| CoreError::InvalidBody(rejection.body_text()))?;
    let command = Command::parse(&body)?;
    info!("收到 POST 请求，操作: {}", command.action());
    state.catalog.execute(command).await
}
