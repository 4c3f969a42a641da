//! 核心错误处理模块

use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use super::response::ApiResponse;
use crate::infrastructure::sheet::StoreError;

/// 核心错误类型
///
/// `Display` 的内容就是返回给调用方的 `message`。所有错误都以
/// `{success: false, message}` 的形式、HTTP 200 返回。
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("No IDs provided for deletion")]
    NoIdsProvided,
    #[error("Upsert failed: {0}")]
    InvalidProducts(String),
    #[error("{0}")]
    List(StoreError),
    #[error("Upsert failed: {0}")]
    Upsert(StoreError),
    #[error("Delete failed: {0}")]
    Delete(StoreError),
    #[error("Server error: {0}")]
    Internal(String),
}

impl CoreError {
    /// 调用方输入错误，没有访问存储
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidJson
                | CoreError::InvalidBody(_)
                | CoreError::UnknownAction(_)
                | CoreError::NoIdsProvided
                | CoreError::InvalidProducts(_)
        )
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        if self.is_input_error() {
            warn!("请求无效: {}", message);
        } else {
            error!("请求处理失败: {}", message);
        }

        ApiResponse::<()>::failure(message).into_response()
    }
}
