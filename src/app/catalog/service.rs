//! 商品目录业务服务

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::codec::{self, RowCodec, HEADER_ROWS, ROW_WIDTH};
use super::command::Command;
use super::model::{Product, ProductInput};
use crate::core::{error::CoreError, response::ApiResponse};
use crate::infrastructure::sheet::SheetStore;

/// 列表、整体替换、按 id 删除
///
/// 同一时间只执行一个操作：每个操作在开始前获取 `gate`，
/// 直到读写全部完成才释放。
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn SheetStore>,
    sheet: String,
    codec: RowCodec,
    gate: Arc<Mutex<()>>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn SheetStore>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
            codec: RowCodec::default(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_codec(mut self, codec: RowCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// 读取全部商品，跳过空行，保持表格中的顺序
    pub async fn list(&self) -> Result<ApiResponse<Vec<Product>>, CoreError> {
        let _turn = self.gate.lock().await;

        let rows = self.store.read_all(&self.sheet).await.map_err(CoreError::List)?;
        debug!("工作表 {} 共 {} 行", self.sheet, rows.len());

        if rows.len() <= HEADER_ROWS {
            return Ok(ApiResponse::success(Vec::new()));
        }

        let products: Vec<Product> = rows[HEADER_ROWS..]
            .iter()
            .filter(|row| !codec::is_blank(row))
            .map(|row| self.codec.decode(row))
            .collect();

        let combos = products.iter().filter(|product| product.is_combo()).count();
        info!("读取商品 {} 个，其中组合商品 {} 个", products.len(), combos);
        Ok(ApiResponse::success(products))
    }

    /// 用 `products` 整体替换表头之后的内容
    ///
    /// 不在 `products` 中的旧商品全部丢弃，调用方必须提交完整的商品集合。
    pub async fn upsert(&self, products: &[ProductInput]) -> Result<ApiResponse<()>, CoreError> {
        let _turn = self.gate.lock().await;
        info!("整体写入 {} 个商品", products.len());

        let now = codec::now_timestamp();
        let rows: Vec<_> = products
            .iter()
            .map(|product| self.codec.encode_at(product, &now))
            .collect();

        self.store
            .replace_body(&self.sheet, HEADER_ROWS, ROW_WIDTH, &rows)
            .await
            .map_err(CoreError::Upsert)?;

        info!("成功写入 {} 行", rows.len());
        Ok(ApiResponse::affected("Data saved successfully", rows.len()))
    }

    /// 删除 A 列等于 `ids` 中任一值的所有行
    pub async fn delete(&self, ids: &[String]) -> Result<ApiResponse<()>, CoreError> {
        if ids.is_empty() {
            return Err(CoreError::NoIdsProvided);
        }

        let _turn = self.gate.lock().await;
        info!("删除商品: {:?}", ids);

        let rows = self
            .store
            .read_all(&self.sheet)
            .await
            .map_err(CoreError::Delete)?;
        if rows.len() <= HEADER_ROWS {
            return Ok(ApiResponse::affected("No data to delete", 0));
        }

        // 从后往前收集行号（从 1 开始），删除时前面的行号不受影响
        let targets: Vec<usize> = (HEADER_ROWS..rows.len())
            .rev()
            .filter(|&index| {
                let id = rows[index].first().map(|cell| cell.to_text()).unwrap_or_default();
                ids.contains(&id)
            })
            .map(|index| index + 1)
            .collect();

        let mut deleted = 0;
        for row in targets {
            self.store
                .delete_row(&self.sheet, row)
                .await
                .map_err(CoreError::Delete)?;
            deleted += 1;
        }

        info!("成功删除 {} 行", deleted);
        Ok(ApiResponse::affected("Products deleted successfully", deleted))
    }

    pub async fn execute(&self, command: Command) -> Result<ApiResponse<()>, CoreError> {
        match command {
            Command::Upsert(products) => self.upsert(&products).await,
            Command::Delete(ids) => self.delete(&ids).await,
        }
    }
}
