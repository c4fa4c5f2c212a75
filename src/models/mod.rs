//! # 数据模型模块
//!
//! 定义峰形参数与压力标定结果数据模型。
//!
//! ## 依赖关系
//! - 被 `fitting/` 和 `commands/` 使用
//! - 子模块: peak, calibration

pub mod calibration;
pub mod peak;

pub use calibration::CalibrationRecord;
pub use peak::{PeakParameters, ProfileShape};
