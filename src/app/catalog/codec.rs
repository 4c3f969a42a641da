//! 行编解码
//!
//! 表格的一行固定 9 列，按位置对应商品字段：
//!
//! | 列 | A | B | C | D | E | F | G | H | I |
//! |----|---|---|---|---|---|---|---|---|---|
//! | 字段 | id | name | price | duration | unit | note | updateAT | category | comboProducts |
//!
//! 空单元格、空字符串和数字 0 都视为缺失，取字段默认值；
//! 末尾缺少的单元格同样取默认值。

use chrono::{SecondsFormat, Utc};

use crate::infrastructure::sheet::CellValue;

use super::model::{Product, ProductInput};

pub const ROW_WIDTH: usize = 9;
pub const HEADER_ROWS: usize = 1;

pub const DEFAULT_PRICE: f64 = 0.0;
pub const DEFAULT_DURATION: f64 = 1.0;
pub const DEFAULT_UNIT: &str = "month";
pub const DEFAULT_CATEGORY: &str = "AI Services";
pub const COMBO_CATEGORY: &str = "Combo";

const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_PRICE: usize = 2;
const COL_DURATION: usize = 3;
const COL_UNIT: usize = 4;
const COL_NOTE: usize = 5;
const COL_UPDATE_AT: usize = 6;
const COL_CATEGORY: usize = 7;
const COL_COMBO: usize = 8;

/// A、B 两列都为空的行是空行，列表时跳过
pub fn is_blank(row: &[CellValue]) -> bool {
    present(row, COL_ID).is_none() && present(row, COL_NAME).is_none()
}

/// 当前时间，ISO-8601 毫秒精度，`Z` 结尾
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn present(row: &[CellValue], col: usize) -> Option<&CellValue> {
    row.get(col).filter(|cell| !cell.is_missing())
}

fn text_or(row: &[CellValue], col: usize, default: &str) -> String {
    present(row, col).map_or_else(|| default.to_string(), CellValue::to_text)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|n| *n != 0.0 && !n.is_nan())
}

#[derive(Debug, Clone)]
pub struct RowCodec {
    default_unit: String,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self::with_default_unit(DEFAULT_UNIT)
    }
}

impl RowCodec {
    pub fn with_default_unit(unit: impl Into<String>) -> Self {
        Self {
            default_unit: unit.into(),
        }
    }

    pub fn default_unit(&self) -> &str {
        &self.default_unit
    }

    pub fn decode(&self, row: &[CellValue]) -> Product {
        Product {
            id: text_or(row, COL_ID, ""),
            name: text_or(row, COL_NAME, ""),
            price: present(row, COL_PRICE)
                .and_then(CellValue::to_number)
                .unwrap_or(DEFAULT_PRICE),
            duration: non_zero(present(row, COL_DURATION).and_then(CellValue::to_number))
                .unwrap_or(DEFAULT_DURATION),
            unit: text_or(row, COL_UNIT, &self.default_unit),
            note: text_or(row, COL_NOTE, ""),
            update_at: text_or(row, COL_UPDATE_AT, ""),
            category: text_or(row, COL_CATEGORY, DEFAULT_CATEGORY),
            combo_products: text_or(row, COL_COMBO, ""),
        }
    }

    pub fn encode(&self, product: &ProductInput) -> Vec<CellValue> {
        self.encode_at(product, &now_timestamp())
    }

    /// 以给定时间戳作为缺省的 `updateAT` 编码
    ///
    /// 别名优先：`H` 存在时覆盖 `category`，`I` 存在时覆盖 `comboProducts`。
    pub fn encode_at(&self, product: &ProductInput, now: &str) -> Vec<CellValue> {
        let category = non_empty(&product.h)
            .or_else(|| non_empty(&product.category))
            .unwrap_or(DEFAULT_CATEGORY);
        let combo_products = non_empty(&product.i)
            .or_else(|| non_empty(&product.combo_products))
            .unwrap_or("");

        vec![
            CellValue::text(non_empty(&product.id).unwrap_or("")),
            CellValue::text(non_empty(&product.name).unwrap_or("")),
            CellValue::number(non_zero(product.price).unwrap_or(DEFAULT_PRICE)),
            CellValue::number(non_zero(product.duration).unwrap_or(DEFAULT_DURATION)),
            CellValue::text(non_empty(&product.unit).unwrap_or(self.default_unit.as_str())),
            CellValue::text(non_empty(&product.note).unwrap_or("")),
            CellValue::text(non_empty(&product.update_at).unwrap_or(now)),
            CellValue::text(category),
            CellValue::text(combo_products),
        ]
    }
}
