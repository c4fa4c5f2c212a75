//! # 状态方程模块
//!
//! 由标定物衍射峰位计算压力。
//!
//! ## 子模块
//! - `table`: 标定物 V0, K0, K0' 温度参数表与插值
//! - `pressure`: 能量/2θ → 原子体积 → 压力
//!
//! ## 依赖关系
//! - 被 `commands/pressure.rs`, `commands/calibrate.rs` 使用
//! - 无其他内部依赖

pub mod pressure;
pub mod table;

pub use pressure::{calculate_pressure, BraggPeak, PressureCalculator};
pub use table::{load_eos_params, Calibrant, EosParameters};
