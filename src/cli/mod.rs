//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `pressure`: 由单个 2θ 计算压力
//! - `fit`: 对单个扫描拟合赝 Voigt 峰
//! - `calibrate`: 拟合 + 压力计算（单文件或批量目录）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: pressure, fit, calibrate

pub mod calibrate;
pub mod fit;
pub mod pressure;

use clap::{Parser, Subcommand};

/// PressXRD - 金标压力的 X 射线衍射标定工具
#[derive(Parser)]
#[command(name = "pressxrd")]
#[command(version)]
#[command(about = "Pressure calibration from the X-ray diffraction peak of a gold standard", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Compute pressure from a single 2θ peak position
    Pressure(pressure::PressureArgs),

    /// Fit a pseudo-Voigt peak to one scan
    Fit(fit::FitArgs),

    /// Fit scans and convert the peak positions to pressure
    Calibrate(calibrate::CalibrateArgs),
}
