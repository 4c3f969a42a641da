use sheet_catalog::app::{self, catalog::codec::RowCodec};
use sheet_catalog::config;
use sheet_catalog::infrastructure::{logger::Logger, sheet::open_store};
use sheet_catalog::{AppState, CatalogService};
use std::env;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 第一个命令行参数可指定配置文件
    let explicit = env::args().nth(1);
    let (config, source) = config::load_config(explicit.as_deref())?;
    config.validate()?;

    let _log_guard = Logger::init(&config.logging)?;
    info!("{}", source);

    let store = open_store(&config.sheet).await?;
    let catalog = CatalogService::new(store, config.sheet.name.clone())
        .with_codec(RowCodec::with_default_unit(config.sheet.default_unit.clone()));
    let app = app::router(AppState { catalog }, &config.http);

    let addr = config.http.socket_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 商品目录服务运行在 http://{}", addr);
    info!("   GET  {}  - 列出商品", config.http.endpoint);
    info!("   POST {}  - upsert / delete", config.http.endpoint);
    info!("   GET  {}  - 健康检查", app::HEALTH_PATH);

    axum::serve(listener, app).await?;
    Ok(())
}
