//! # 压力标定结果数据模型
//!
//! 单次扫描的拟合峰位与由此得到的压力。
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 使用
//! - 被 `report/export.rs` 写出为 CSV

use crate::eos::{BraggPeak, Calibrant};
use crate::models::PeakParameters;

use serde::{Deserialize, Serialize};

/// 压力标定结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// 扫描名称
    pub scan: String,

    /// 拟合峰位 2θ（度）
    pub x0: f64,

    /// 峰宽 sigma（度）
    pub sigma: f64,

    /// 积分强度
    pub amplitude: f64,

    /// 背底
    pub constant: f64,

    /// Lorentz 比例
    pub alpha: f64,

    /// 温度来源（命令行指定时为空）
    pub temperature_source: Option<String>,

    /// 温度（K）
    pub temperature_k: f64,

    /// X 射线能量（keV）
    pub energy_kev: f64,

    /// 标定物
    pub calibrant: String,

    /// 衍射指数
    pub bragg_peak: String,

    /// 2θ 零点偏移（度）
    pub tth_offset: f64,

    /// 压力（GPa）
    pub pressure_gpa: f64,
}

impl CalibrationRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scan: impl Into<String>,
        peak: &PeakParameters,
        temperature_source: Option<String>,
        temperature_k: f64,
        energy_kev: f64,
        calibrant: Calibrant,
        bragg_peak: BraggPeak,
        tth_offset: f64,
        pressure_gpa: f64,
    ) -> Self {
        CalibrationRecord {
            scan: scan.into(),
            x0: peak.x0,
            sigma: peak.sigma,
            amplitude: peak.amplitude,
            constant: peak.constant,
            alpha: peak.alpha,
            temperature_source,
            temperature_k,
            energy_kev,
            calibrant: calibrant.to_string(),
            bragg_peak: bragg_peak.to_string(),
            tth_offset,
            pressure_gpa,
        }
    }

    /// 拟合峰参数
    pub fn peak(&self) -> PeakParameters {
        PeakParameters::new(self.x0, self.sigma, self.amplitude, self.constant, self.alpha)
    }
}
