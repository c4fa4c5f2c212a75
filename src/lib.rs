//! # PressXRD - X 射线衍射压力标定
//!
//! 由金标衍射峰位计算样品压力：拟合扫描中的赝 Voigt 峰，
//! 将峰位经 Bragg 定律换算为原子体积，再由 Holzapfel AP2 状态方程求压力。
//!
//! ## 模块
//! - `parsers` - 扫描头（温度、能量）与扫描列数据解析
//! - `fitting` - 赝 Voigt 峰形与 Levenberg-Marquardt 拟合
//! - `eos` - 标定物状态方程参数表与压力计算
//! - `models` - 峰参数与标定结果
//! - `report` - 图表与结果导出
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (格式解析器)
//!   │     ├── fitting/   (峰拟合)
//!   │     ├── eos/       (状态方程)
//!   │     ├── report/    (图表与导出)
//!   │     └── batch/     (批量处理)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod eos;
pub mod error;
pub mod fitting;
pub mod models;
pub mod parsers;
pub mod report;
pub mod utils;

pub use eos::{calculate_pressure, load_eos_params};
pub use error::{PressXrdError, Result};
pub use fitting::fit_peak;
pub use parsers::{parse_energy, parse_temperatures};
