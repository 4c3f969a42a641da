//! JSON 文件表格存储
//!
//! 整个工作簿保存为一个 JSON 文档，每次修改都在同一把锁内完成
//! “读取 → 修改 → 写临时文件 → 重命名”，进程重启后数据仍然存在。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::grid::{self, Grid};
use super::{CellValue, SheetRange, SheetStore, StoreError};

/// 磁盘上的工作簿格式
#[derive(Debug, Default, Serialize, Deserialize)]
struct Workbook {
    sheets: BTreeMap<String, Grid>,
}

pub struct JsonFileSheetStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileSheetStore {
    /// 打开工作簿文件，不存在时创建；工作表不存在时以 `header` 为表头创建
    pub async fn open(
        path: impl AsRef<Path>,
        sheet: &str,
        header: Vec<CellValue>,
    ) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };

        let _guard = store.lock.lock().await;
        let mut workbook = store.load().await?;
        if !workbook.sheets.contains_key(sheet) {
            info!("创建工作表 {} 于 {}", sheet, store.path.display());
            workbook.sheets.insert(sheet.to_string(), vec![header]);
            store.save(&workbook).await?;
        }
        drop(_guard);

        Ok(store)
    }

    async fn load(&self) -> Result<Workbook, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Workbook::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, workbook: &Workbook) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec_pretty(workbook)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("工作簿已保存: {}", self.path.display());
        Ok(())
    }

    async fn modify(
        &self,
        sheet: &str,
        f: impl FnOnce(&mut Grid) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut workbook = self.load().await?;
        let grid = workbook
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;
        f(grid)?;
        grid::truncate_unused(grid);
        self.save(&workbook).await
    }
}

#[async_trait]
impl SheetStore for JsonFileSheetStore {
    async fn read_all(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        let _guard = self.lock.lock().await;
        let workbook = self.load().await?;
        let grid = workbook
            .sheets
            .get(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?;
        Ok(grid::used_range(grid))
    }

    async fn clear_range(&self, sheet: &str, range: SheetRange) -> Result<(), StoreError> {
        self.modify(sheet, |g| grid::clear(g, range)).await
    }

    async fn write_range(
        &self,
        sheet: &str,
        row: usize,
        column: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        self.modify(sheet, |g| grid::write(g, row, column, values)).await
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        self.modify(sheet, |g| grid::delete_row(g, row)).await
    }

    async fn replace_body(
        &self,
        sheet: &str,
        header_rows: usize,
        width: usize,
        values: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        self.modify(sheet, |g| grid::replace_body(g, header_rows, width, values))
            .await
    }
}
