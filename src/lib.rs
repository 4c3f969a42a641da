//! # 表格商品目录服务
//!
//! 一个很薄的 HTTP 接口，把类似电子表格的存储当作商品目录使用：
//! - GET 列出全部商品
//! - POST `{action: "upsert", products}` 用提交的商品整体替换表格内容
//! - POST `{action: "delete", ids}` 按 id 删除行
//!
//! 所有响应都是 `{success, data?, message?, rowsAffected?}`，HTTP 状态码恒为 200。

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::catalog::{AppState, CatalogService, Product, ProductInput};
pub use crate::core::{error::CoreError, response::ApiResponse};
