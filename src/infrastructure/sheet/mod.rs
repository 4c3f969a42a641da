//! 表格存储适配层
//!
//! 商品目录保存在一个类似电子表格的二维结构中。业务层只通过
//! [`SheetStore`] 的四个基本操作访问它：读取已用区域、清空区域、
//! 写入区域、按行号删除行。行号和列号都从 1 开始，与电子表格一致。

mod cell;
pub mod file;
pub mod grid;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{SheetBackend, SheetConfig};

pub use cell::{format_number, CellValue};
pub use file::JsonFileSheetStore;
pub use memory::MemorySheetStore;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
    #[error("Row {row} is out of range")]
    RowOutOfRange { row: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// 矩形区域，等价于电子表格的 `getRange(row, column, numRows, numColumns)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetRange {
    pub row: usize,
    pub column: usize,
    pub num_rows: usize,
    pub num_columns: usize,
}

impl SheetRange {
    pub fn new(row: usize, column: usize, num_rows: usize, num_columns: usize) -> Self {
        Self {
            row,
            column,
            num_rows,
            num_columns,
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.row == 0 || self.column == 0 {
            return Err(StoreError::RowOutOfRange { row: self.row });
        }
        Ok(())
    }
}

/// 表格存储后端
///
/// 所有方法都按表名查找工作表，找不到时返回 [`StoreError::SheetNotFound`]。
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// 读取已用区域（第 1 行到最后一个非空行）
    async fn read_all(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>, StoreError>;

    /// 最后一个非空行的行号，空表为 0
    async fn last_row(&self, sheet: &str) -> Result<usize, StoreError> {
        Ok(self.read_all(sheet).await?.len())
    }

    /// 清空区域内容，不删除行
    async fn clear_range(&self, sheet: &str, range: SheetRange) -> Result<(), StoreError>;

    /// 从 (row, column) 开始写入矩形区域
    async fn write_range(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError>;

    /// 删除一行，后面的行上移
    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError>;

    /// 用 `values` 替换表头之后的全部内容
    ///
    /// 默认实现是“先清空再写入”两次独立调用，中间可能被读到空表。
    /// 能在一次锁或事务内完成的后端应当覆盖此方法。
    async fn replace_body(
        &self,
        sheet: &str,
        header_rows: usize,
        width: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        let last_row = self.last_row(sheet).await?;
        if let Some(range) = grid::body_range(last_row, header_rows, width) {
            self.clear_range(sheet, range).await?;
        }
        if !values.is_empty() {
            self.write_range(sheet, header_rows + 1, 1, values).await?;
        }
        Ok(())
    }
}

/// 根据配置打开存储后端，并确保目标工作表存在
pub async fn open_store(config: &SheetConfig) -> anyhow::Result<Arc<dyn SheetStore>> {
    let header: Vec<CellValue> = config.header.iter().map(CellValue::text).collect();

    let store: Arc<dyn SheetStore> = match config.backend {
        SheetBackend::Memory => {
            info!("使用内存表格存储，工作表: {}", config.name);
            Arc::new(MemorySheetStore::new().with_sheet(&config.name, vec![header]))
        }
        SheetBackend::File => {
            info!("使用文件表格存储: {}", config.path.display());
            Arc::new(JsonFileSheetStore::open(&config.path, &config.name, header).await?)
        }
        #[cfg(feature = "database")]
        SheetBackend::Postgres => {
            let url = config.resolved_database_url();
            let manager = crate::infrastructure::database::DatabaseManager::new(&url).await?;
            info!("使用 PostgreSQL 表格存储，工作表: {}", config.name);
            Arc::new(
                crate::infrastructure::database::PgSheetStore::open(manager, &config.name, header)
                    .await?,
            )
        }
        #[cfg(not(feature = "database"))]
        SheetBackend::Postgres => {
            anyhow::bail!("postgres backend requires the `database` feature");
        }
    };

    Ok(store)
}
