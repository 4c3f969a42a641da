//! 数据库基础设施
//!
//! PostgreSQL 版本的表格存储。每个工作表的每一行存为 `sheet_rows`
//! 中的一条记录，单元格以 JSONB 数组保存。所有修改操作都在一个事务里
//! 锁住工作表、重写整张表，因此 `replace_body` 对读者是原子的。

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    types::Json,
    Error, Postgres, Transaction,
};
use std::time::Duration;
use tracing::info;

use super::sheet::grid::{self, Grid};
use super::sheet::{CellValue, SheetRange, SheetStore, StoreError};

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(database_url: &str) -> Result<Self, Error> {
        info!(
            "连接数据库: {}",
            mask_password(database_url)
        );

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// 创建工作表所需的表结构
    pub async fn create_tables(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheets (
                name TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sheet_rows (
                sheet TEXT NOT NULL REFERENCES sheets(name) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                cells JSONB NOT NULL,
                PRIMARY KEY (sheet, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn mask_password(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme_end + 3],
                    &credentials[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

pub struct PgSheetStore {
    db: DatabaseManager,
}

impl PgSheetStore {
    /// 建表，并在工作表不存在时以 `header` 为表头创建
    pub async fn open(
        db: DatabaseManager,
        sheet: &str,
        header: Vec<CellValue>,
    ) -> Result<Self, StoreError> {
        db.create_tables().await?;

        // 工作表与表头行在同一事务中创建，避免留下没有表头的工作表
        let mut tx = db.get_pool().begin().await?;
        let created = sqlx::query("INSERT INTO sheets (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(sheet)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if created > 0 {
            info!("创建工作表: {}", sheet);
            sqlx::query("INSERT INTO sheet_rows (sheet, position, cells) VALUES ($1, 1, $2)")
                .bind(sheet)
                .bind(Json(header))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(Self { db })
    }

    async fn load_grid(
        tx: &mut Transaction<'_, Postgres>,
        sheet: &str,
    ) -> Result<Grid, StoreError> {
        let rows: Vec<(i32, Json<Vec<CellValue>>)> = sqlx::query_as(
            "SELECT position, cells FROM sheet_rows WHERE sheet = $1 ORDER BY position",
        )
        .bind(sheet)
        .fetch_all(&mut **tx)
        .await?;

        let mut grid = Grid::new();
        for (position, Json(cells)) in rows {
            let index = (position.max(1) - 1) as usize;
            if grid.len() <= index {
                grid.resize_with(index + 1, Vec::new);
            }
            grid[index] = cells;
        }
        Ok(grid)
    }

    async fn lock_sheet(tx: &mut Transaction<'_, Postgres>, sheet: &str) -> Result<(), StoreError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sheets WHERE name = $1 FOR UPDATE")
                .bind(sheet)
                .fetch_optional(&mut **tx)
                .await?;
        found
            .map(|_| ())
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    async fn modify(
        &self,
        sheet: &str,
        f: impl FnOnce(&mut Grid) -> Result<(), StoreError> + Send,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.get_pool().begin().await?;
        Self::lock_sheet(&mut tx, sheet).await?;

        let mut grid = Self::load_grid(&mut tx, sheet).await?;
        f(&mut grid)?;
        grid::truncate_unused(&mut grid);

        sqlx::query("DELETE FROM sheet_rows WHERE sheet = $1")
            .bind(sheet)
            .execute(&mut *tx)
            .await?;
        for (index, cells) in grid.into_iter().enumerate() {
            sqlx::query("INSERT INTO sheet_rows (sheet, position, cells) VALUES ($1, $2, $3)")
                .bind(sheet)
                .bind(index as i32 + 1)
                .bind(Json(cells))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for PgSheetStore {
    async fn read_all(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        let mut tx = self.db.get_pool().begin().await?;
        let exists: Option<(String,)> = sqlx::query_as("SELECT name FROM sheets WHERE name = $1")
            .bind(sheet)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::SheetNotFound(sheet.to_string()));
        }

        let grid = Self::load_grid(&mut tx, sheet).await?;
        tx.commit().await?;
        Ok(grid::used_range(&grid))
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
