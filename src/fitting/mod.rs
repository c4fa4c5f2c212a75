//! # 峰拟合模块
//!
//! 提供赝 Voigt 峰形与单峰非线性最小二乘拟合。
//!
//! ## 子模块
//! - `profile`: 赝 Voigt 峰形及其偏导数
//! - `fitter`: 初值估计与峰拟合
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 使用
//! - 使用 `models/peak.rs`
//! - 使用 `levenberg-marquardt` 求解最小二乘

pub mod fitter;
pub mod profile;

pub use fitter::{fit_peak, initial_guess, window_seed, FitOutcome, LevMarSettings, PeakFitter};
pub use profile::pseudo_voigt;
