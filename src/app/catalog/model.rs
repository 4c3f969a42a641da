//! 商品目录数据模型

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::infrastructure::sheet::format_number;

use super::codec::COMBO_CATEGORY;

/// 商品，对应表格中的一行 (A–I)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_number")]
    pub price: f64,
    #[serde(serialize_with = "serialize_number")]
    pub duration: f64,
    pub unit: String,
    pub note: String,
    #[serde(rename = "updateAT")]
    pub update_at: String,
    pub category: String,
    #[serde(rename = "comboProducts")]
    pub combo_products: String,
}

impl Product {
    /// 组合商品的 `combo_products` 是其他商品 id 的逗号分隔列表
    pub fn is_combo(&self) -> bool {
        self.category == COMBO_CATEGORY
    }
}

/// upsert 请求中的单个商品，所有字段都可省略
///
/// `H` / `I` 是按列字母传值的调用方使用的别名，分别覆盖
/// `category` / `comboProducts`。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductInput {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: Option<String>,
    #[serde(rename = "updateAT", default, deserialize_with = "lenient_string")]
    pub update_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(rename = "comboProducts", default, deserialize_with = "lenient_string")]
    pub combo_products: Option<String>,
    #[serde(rename = "H", default, deserialize_with = "lenient_string")]
    pub h: Option<String>,
    #[serde(rename = "I", default, deserialize_with = "lenient_string")]
    pub i: Option<String>,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            name: Some(product.name.clone()),
            price: Some(product.price),
            duration: Some(product.duration),
            unit: Some(product.unit.clone()),
            note: Some(product.note.clone()),
            update_at: Some(product.update_at.clone()),
            category: Some(product.category.clone()),
            combo_products: Some(product.combo_products.clone()),
            h: None,
            i: None,
        }
    }
}

/// 整数输出为 JSON 整数（`100000` 而不是 `100000.0`）
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// 任意 JSON 值都接受：字符串原样保留，数字按表格方式格式化，
/// 对象和数组保存为 JSON 文本，null 视为缺省
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(format_number),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// 数字或可解析为数字的字符串，其余值视为缺省，由编码时的默认值补齐
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}
