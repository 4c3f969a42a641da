//! 商品目录：表格行与商品之间的映射，以及列表 / 整体替换 / 删除三个操作

pub mod codec;
pub mod command;
pub mod handler;
pub mod model;
pub mod service;

pub use handler::AppState;
pub use model::{Product, ProductInput};
pub use service::CatalogService;
