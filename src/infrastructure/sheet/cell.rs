//! 单元格值

use serde::{Deserialize, Serialize};

/// 表格中的一个单元格
///
/// 序列化为 JSON 时：空单元格为 `null`，数字为 number，文本为 string。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 由字符串构造单元格，空字符串写入为空单元格
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn number(value: f64) -> Self {
        CellValue::Number(value)
    }

    /// 单元格是否没有任何内容（用于计算已用区域）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 单元格是否视为“缺失”：空单元格、空字符串以及数字 0
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            other => other.is_empty(),
        }
    }

    /// 单元格的文本形式，整数不带小数部分
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// 单元格的数值形式，文本会尝试按数字解析
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// 数字的文本表示：整数输出为 `42`，其余保持 `f64` 的默认格式
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
