//! # 批量处理模块
//!
//! 对目录中的多个扫描文件批量执行压力标定。
//!
//! ## 功能
//! - 收集匹配的扫描文件
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
