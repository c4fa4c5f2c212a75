//! # 结果输出模块
//!
//! 导出标定结果与拟合曲线，生成拟合图表。
//!
//! ## 子模块
//! - `export`: CSV / XY 导出
//! - `plot`: 图表生成
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 使用
//! - 使用 `models/` 数据模型

pub mod export;
pub mod plot;

pub use plot::{generate_fit_plot, FitPlot};
