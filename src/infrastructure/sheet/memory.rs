//! 内存表格存储

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::grid::{self, Grid};
use super::{CellValue, SheetRange, SheetStore, StoreError};

/// 进程内的工作簿，多个工作表按名称索引
#[derive(Default)]
pub struct MemorySheetStore {
    sheets: RwLock<HashMap<String, Grid>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个工作表及其初始内容
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Grid) -> Self {
        self.sheets.get_mut().insert(name.into(), rows);
        self
    }

    /// 当前工作表的完整网格（包含末尾的空行），测试中用于检查清空行为
    pub async fn snapshot(&self, sheet: &str) -> Option<Grid> {
        self.sheets.read().await.get(sheet).cloned()
    }

    async fn with_grid<T>(
        &self,
        sheet: &str,
        f: impl FnOnce(&mut Grid) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut sheets = self.sheets.write().await;
        let grid = sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;
        f(grid)
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_all(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        let sheets = self.sheets.read().await;
        let grid = sheets
            .get(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;
        Ok(grid::used_range(grid))
    }

    async fn clear_range(&self, sheet: &str, range: SheetRange) -> Result<(), StoreError> {
        self.with_grid(sheet, |g| grid::clear(g, range)).await
    }

    async fn write_range(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        self.with_grid(sheet, |g| grid::write(g, row, column, values)).await
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        self.with_grid(sheet, |g| grid::delete_row(g, row)).await
    }

    async fn replace_body(
        &self,
        sheet: &str,
        header_rows: usize,
        width: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        self.with_grid(sheet, |g| grid::replace_body(g, header_rows, width, values))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<CellValue> {
        vec![CellValue::text("id"), CellValue::text("name")]
    }

    #[tokio::test]
    async fn test_missing_sheet() {
        let store = MemorySheetStore::new().with_sheet("Sheet1", vec![header()]);

        let err = store.read_all("Other").await.unwrap_err();
        assert_eq!(err.to_string(), "Sheet not found: Other");
        assert!(store.delete_row("Other", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_then_write_via_default_steps() {
        let store = MemorySheetStore::new().with_sheet(
            "Sheet1",
            vec![header(), vec![CellValue::text("a")], vec![CellValue::text("b")]],
        );

        assert_eq!(store.last_row("Sheet1").await.unwrap(), 3);
        store
            .clear_range("Sheet1", SheetRange::new(2, 1, 2, 9))
            .await
            .unwrap();
        assert_eq!(store.last_row("Sheet1").await.unwrap(), 1);

        // 清空不删除行
        assert_eq!(store.snapshot("Sheet1").await.unwrap().len(), 3);

        store
            .write_range("Sheet1", 2, 1, &[vec![CellValue::text("c")]])
            .await
            .unwrap();
        let rows = store.read_all("Sheet1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], CellValue::text("c"));
    }
}
