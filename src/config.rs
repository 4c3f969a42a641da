//! 服务配置
//!
//! 配置文件为 TOML 格式，查找顺序：命令行第一个参数、`CATALOG_CONFIG`
//! 环境变量、`config.toml`、`./config/config.toml`，都不存在时使用默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::catalog::codec::{DEFAULT_UNIT, ROW_WIDTH};

/// 默认请求体上限 32 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// 服务配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务配置
    pub http: HttpConfig,
    /// 表格存储配置
    pub sheet: SheetConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口
    pub port: u16,
    /// 商品目录接口路径
    pub endpoint: String,
    /// 允许的跨域来源，为空时允许任意来源
    pub cors_origins: Vec<String>,
    /// POST 请求体上限（字节），upsert 需要提交完整商品集合
    pub max_body_bytes: usize,
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetBackend {
    Memory,
    File,
    Postgres,
}

/// 表格存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// 工作表名称
    pub name: String,
    pub backend: SheetBackend,
    /// 文件后端的工作簿路径
    pub path: PathBuf,
    /// PostgreSQL 连接串，`DATABASE_URL` 环境变量优先
    pub database_url: String,
    /// 新建工作表时写入的表头
    pub header: Vec<String>,
    /// 单位列为空时的默认值
    pub default_unit: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志文件路径
    pub log_path: PathBuf,
    /// 日志文件名前缀
    pub file_prefix: String,
    /// 是否启用控制台输出
    pub console_output: bool,
    /// 是否写入日志文件
    pub file_output: bool,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            endpoint: "/".to_string(),
            cors_origins: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            name: "Sheet1".to_string(),
            backend: SheetBackend::File,
            path: PathBuf::from("./data/catalog.json"),
            database_url: String::new(),
            header: [
                "id",
                "name",
                "price",
                "duration",
                "unit",
                "note",
                "updateAT",
                "category",
                "comboProducts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_unit: DEFAULT_UNIT.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./logs"),
            file_prefix: "sheet-catalog".to_string(),
            console_output: true,
            file_output: true,
            level: "info".to_string(),
        }
    }
}

impl SheetConfig {
    /// 实际使用的数据库连接串
    pub fn resolved_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database_url.clone())
    }
}

impl HttpConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        // 确保目录存在
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::FileWrite(e.to_string()))?;
        }

        fs::write(path.as_ref(), content).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证HTTP配置
        if self.http.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }
        if !self.http.endpoint.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "接口路径必须以 / 开头: {}",
                self.http.endpoint
            )));
        }
        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::Validation("请求体上限必须大于0".to_string()));
        }
        if self.http.endpoint == crate::app::HEALTH_PATH {
            return Err(ConfigError::Validation(format!(
                "接口路径不能与健康检查路径相同: {}",
                crate::app::HEALTH_PATH
            )));
        }

        // 验证存储配置
        if self.sheet.name.is_empty() {
            return Err(ConfigError::Validation("工作表名称不能为空".to_string()));
        }
        if self.sheet.header.len() > ROW_WIDTH {
            return Err(ConfigError::Validation(format!(
                "表头最多 {} 列，当前 {} 列",
                ROW_WIDTH,
                self.sheet.header.len()
            )));
        }
        if self.sheet.backend == SheetBackend::Postgres {
            if !cfg!(feature = "database") {
                return Err(ConfigError::Validation(
                    "postgres 后端需要启用 database 特性".to_string(),
                ));
            }
            if self.sheet.resolved_database_url().is_empty() {
                return Err(ConfigError::Validation(
                    "postgres 后端需要配置 database_url 或 DATABASE_URL".to_string(),
                ));
            }
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("文件写入错误: {0}")]
    FileWrite(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置序列化错误: {0}")]
    Serialize(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 从文件或默认值加载配置
///
/// 日志系统尚未初始化时调用，因此返回配置来源说明，由调用方在日志就绪后输出。
pub fn load_config(explicit: Option<&str>) -> Result<(Config, String), ConfigError> {
    if let Some(path) = explicit {
        let config = Config::load_from_file(path)?;
        return Ok((config, format!("从配置文件加载: {}", path)));
    }

    if let Ok(path) = std::env::var("CATALOG_CONFIG") {
        let config = Config::load_from_file(&path)?;
        return Ok((config, format!("从 CATALOG_CONFIG 加载: {}", path)));
    }

    let config_paths = ["config.toml", "./config/config.toml"];

    // 尝试从配置文件加载
    for path in &config_paths {
        if Path::new(path).exists() {
            return Ok((Config::load_from_file(path)?, format!("从配置文件加载: {}", path)));
        }
    }

    // 如果没有找到配置文件，使用默认配置
    Ok((Config::default(), "未找到配置文件，使用默认配置".to_string()))
}
