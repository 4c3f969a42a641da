//! 日志基础设施

use std::io;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 初始化日志系统
    ///
    /// - 日志级别取自配置，设置了 `RUST_LOG` 时以环境变量为准
    /// - 文件日志按日期分割，写入 `log_path/file_prefix.YYYY-MM-DD`
    /// - 控制台日志带颜色
    ///
    /// 返回的 [`WorkerGuard`] 必须在进程退出前一直持有，否则文件日志会丢失。
    pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))?;

        let (file_layer, guard) = if config.file_output {
            std::fs::create_dir_all(&config.log_path)?;
            let file_appender = rolling::daily(&config.log_path, &config.file_prefix);
            let (writer, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false) // 文件中不使用颜色
                .with_target(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

        let console_layer = config
            .console_output
            .then(|| fmt::layer().with_writer(io::stdout).with_ansi(true).boxed());

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()?;

        Ok(guard)
    }
}
