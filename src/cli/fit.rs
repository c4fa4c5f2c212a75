//! # fit 子命令 CLI 定义
//!
//! 扫描列选择与峰形参数也被 `calibrate` 复用。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `cli/calibrate.rs` 使用
//! - 参数传递给 `commands/fit.rs`

use crate::models::ProfileShape;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 解析列分隔符（单个 ASCII 字符，或 "tab"）
pub fn parse_delimiter(input: &str) -> Result<u8, String> {
    match input {
        "tab" | "\\t" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!(
            "Invalid delimiter '{}'. Use a single ASCII character or 'tab'",
            input
        )),
    }
}

/// 峰形选项
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ShapeArg {
    /// Pseudo-Voigt with a fitted Lorentzian fraction
    #[default]
    PseudoVoigt,
    /// Pure Gaussian (alpha fixed at 0)
    Gaussian,
    /// Pure Lorentzian (alpha fixed at 1)
    Lorentzian,
}

impl From<ShapeArg> for ProfileShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::PseudoVoigt => ProfileShape::PseudoVoigt,
            ShapeArg::Gaussian => ProfileShape::Gaussian,
            ShapeArg::Lorentzian => ProfileShape::Lorentzian,
        }
    }
}

/// 初值估计方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SeedArg {
    /// Highest point, width = range/10
    #[default]
    Peak,
    /// Window midpoint, width = range/6, edge-averaged background
    Window,
}

/// 扫描文件与列选择
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Column used as 2θ (default: first column)
    #[arg(short = 'x', long)]
    pub x_column: Option<String>,

    /// Column used as intensity (default: last column)
    #[arg(short = 'y', long)]
    pub y_column: Option<String>,

    /// Monitor column to divide the intensity by
    #[arg(short = 'n', long)]
    pub norm_column: Option<String>,

    /// Column delimiter of the scan file (single character or 'tab')
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

/// 峰形与初值参数
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Peak profile
    #[arg(long, value_enum, default_value = "pseudo-voigt")]
    pub shape: ShapeArg,

    /// Starting Lorentzian fraction (fixed value for gaussian/lorentzian)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// How the automatic starting values are derived
    #[arg(long, value_enum, default_value = "peak")]
    pub seed: SeedArg,
}

/// fit 子命令参数
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Scan file to fit
    pub input: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    // ─────────────────────────────────────────────────────────────
    // 手动初值（覆盖自动估计）
    // ─────────────────────────────────────────────────────────────
    /// Starting peak position
    #[arg(long)]
    pub x0: Option<f64>,

    /// Starting width
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Starting integrated amplitude
    #[arg(long, allow_negative_numbers = true)]
    pub amplitude: Option<f64>,

    /// Starting background
    #[arg(long, allow_negative_numbers = true)]
    pub constant: Option<f64>,

    // ─────────────────────────────────────────────────────────────
    // 输出
    // ─────────────────────────────────────────────────────────────
    /// Save a plot of data and fit (.png or .svg)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Export the fitted curve (.csv or .xy)
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 700)]
    pub height: u32,
}
