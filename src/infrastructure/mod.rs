//! 基础设施层：日志、表格存储

#[cfg(feature = "database")]
pub mod database;
pub mod logger;
pub mod sheet;
