//! 核心响应处理模块

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API 响应结构
///
/// 所有接口都返回这一结构，未设置的字段不出现在 JSON 中：
/// `{success, data?, message?, rowsAffected?}`。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            rows_affected: None,
        }
    }

    /// 写操作成功
    pub fn affected(message: impl Into<String>, rows_affected: usize) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            rows_affected: Some(rows_affected),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            rows_affected: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let json = serde_json::to_value(ApiResponse::success(Vec::<u8>::new())).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": [] }));

        let json = serde_json::to_value(ApiResponse::<()>::affected("Data saved successfully", 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "Data saved successfully",
                "rowsAffected": 2
            })
        );

        let json = serde_json::to_value(ApiResponse::<()>::failure("Invalid JSON format")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Invalid JSON format" })
        );
    }
}
