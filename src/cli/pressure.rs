//! # pressure 子命令 CLI 定义
//!
//! 标定物与衍射峰参数也被 `calibrate` 复用。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `cli/calibrate.rs` 使用
//! - 参数传递给 `commands/pressure.rs`

use crate::eos::{BraggPeak, Calibrant};

use clap::{Args, ValueEnum};

/// 标定物选项
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CalibrantArg {
    /// Gold
    Au,
    /// Silver (EOS table only, pressure not available yet)
    Ag,
}

impl From<CalibrantArg> for Calibrant {
    fn from(arg: CalibrantArg) -> Self {
        match arg {
            CalibrantArg::Au => Calibrant::Au,
            CalibrantArg::Ag => Calibrant::Ag,
        }
    }
}

/// 衍射峰选项
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PeakArg {
    /// (111) reflection
    #[value(name = "111")]
    P111,
    /// (200) reflection
    #[value(name = "200")]
    P200,
    /// (220) reflection
    #[value(name = "220")]
    P220,
}

impl From<PeakArg> for BraggPeak {
    fn from(arg: PeakArg) -> Self {
        match arg {
            PeakArg::P111 => BraggPeak::P111,
            PeakArg::P200 => BraggPeak::P200,
            PeakArg::P220 => BraggPeak::P220,
        }
    }
}

/// 标定物参数（pressure 与 calibrate 共用）
#[derive(Args, Debug, Clone)]
pub struct CalibrantArgs {
    /// Calibrant material
    #[arg(long, value_enum, env = "PRESSXRD_CALIBRANT", default_value = "au")]
    pub calibrant: CalibrantArg,

    /// Bragg reflection the peak belongs to
    #[arg(long, value_enum, env = "PRESSXRD_PEAK", default_value = "111")]
    pub peak: PeakArg,

    /// Zero offset subtracted from the measured 2θ, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub tth_offset: f64,
}

/// pressure 子命令参数
#[derive(Args, Debug)]
pub struct PressureArgs {
    /// Peak position 2θ in degrees
    #[arg(long)]
    pub tth: f64,

    /// Sample temperature in K (0-500)
    #[arg(short, long)]
    pub temperature: f64,

    /// X-ray energy in keV
    #[arg(short, long)]
    pub energy: f64,

    #[command(flatten)]
    pub calibrant: CalibrantArgs,
}
