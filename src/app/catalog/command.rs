//! POST 请求体解析

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::CoreError;
use crate::infrastructure::sheet::format_number;

use super::model::ProductInput;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 用给定商品整体替换表格内容
    Upsert(Vec<ProductInput>),
    /// 删除 A 列等于任一 id 的行
    Delete(Vec<String>),
}

impl Command {
    /// 解析 `{action, products?, ids?}`
    pub fn parse(body: &[u8]) -> Result<Self, CoreError> {
        let request: Value = serde_json::from_slice(body).map_err(|_| CoreError::InvalidJson)?;

        match request.get("action") {
            Some(Value::String(action)) if action == "upsert" => {
                parse_products(request.get("products")).map(Command::Upsert)
            }
            Some(Value::String(action)) if action == "delete" => {
                parse_ids(request.get("ids")).map(Command::Delete)
            }
            other => Err(CoreError::UnknownAction(describe_action(other))),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::Upsert(_) => "upsert",
            Command::Delete(_) => "delete",
        }
    }
}

fn describe_action(action: Option<&Value>) -> String {
    match action {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_products(products: Option<&Value>) -> Result<Vec<ProductInput>, CoreError> {
    let items = products
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::InvalidProducts("products must be an array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(CoreError::InvalidProducts(format!(
                    "product at index {} is not an object",
                    index
                )));
            }
            ProductInput::deserialize(item).map_err(|e| {
                CoreError::InvalidProducts(format!("invalid product at index {}: {}", index, e))
            })
        })
        .collect()
}

/// 字符串原样保留，数字按文本匹配，其他值忽略
fn parse_ids(ids: Option<&Value>) -> Result<Vec<String>, CoreError> {
    let items = match ids.and_then(Value::as_array) {
        Some(items) if !items.is_empty() => items,
        _ => return Err(CoreError::NoIdsProvided),
    };

    let ids: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_f64().map(format_number),
            _ => None,
        })
        .collect();

    if ids.is_empty() {
        return Err(CoreError::NoIdsProvided);
    }
    Ok(ids)
}
