//! # 压力计算器
//!
//! 由标定物 Bragg 峰的 2θ、X 射线能量和温度计算压力。
//!
//! ## 算法概述
//! 1. 能量 → 波长：λ = h·c / E
//! 2. Bragg 定律：d = λ / (2 sin θ)
//! 3. d 间距 → 立方晶格常数 a（按衍射指数）
//! 4. 原子体积 v = a³ / 4（面心立方，每晶胞 4 个原子）
//! 5. Holzapfel AP2 有限应变状态方程：
//!    ```text
//!    x    = (v / v0)^(1/3)
//!    pfg0 = afg · (z / v0)^(5/3)
//!    c0   = -ln(3 K0 / pfg0)
//!    c2   = 3/2 (K0' - 3) - c0
//!    P    = 3 K0 (1 - x) / x⁵ · exp(c0 (1 - x)) · (1 + c2 x (1 - x))
//!    ```
//!
//! ## 参考
//! - W. B. Holzapfel, High Pressure Research 16, 81 (1998)
//! - W. B. Holzapfel et al., J. Phys. Chem. Ref. Data 30, 515 (2001)
//!
//! ## 依赖关系
//! - 被 `commands/pressure.rs`, `commands/calibrate.rs` 调用
//! - 使用 `eos/table.rs` 获取 V0, K0, K0'

use crate::eos::table::{self, Calibrant, EosParameters};
use crate::error::{PressXrdError, Result};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Planck 常数（eV·s）
pub const PLANCK_EV_S: f64 = 4.135667662e-15;

/// 光速（Å/s）
pub const SPEED_OF_LIGHT_A_S: f64 = 2.99792458e18;

/// Fermi 气体压力常数 afg（GPa·Å⁵）
pub const AFG: f64 = 2337.0;

/// 标定峰的衍射指数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BraggPeak {
    /// (111)
    P111,
    /// (200)
    P200,
    /// (220)
    P220,
}

impl BraggPeak {
    /// 立方晶格常数与 d 间距之比 sqrt(h² + k² + l²)
    pub fn lattice_factor(&self) -> f64 {
        match self {
            BraggPeak::P111 => 3.0_f64.sqrt(),
            BraggPeak::P200 => 2.0,
            BraggPeak::P220 => 8.0_f64.sqrt(),
        }
    }
}

impl FromStr for BraggPeak {
    type Err = PressXrdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "111" => Ok(BraggPeak::P111),
            "200" => Ok(BraggPeak::P200),
            "220" => Ok(BraggPeak::P220),
            other => Err(PressXrdError::ValidationError(format!(
                "Could not recognize the {} bragg peak. It must be \"111\", \"200\", or \"220\"",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BraggPeak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BraggPeak::P111 => write!(f, "111"),
            BraggPeak::P200 => write!(f, "200"),
            BraggPeak::P220 => write!(f, "220"),
        }
    }
}

/// X 射线能量（keV）→ 波长（Å）
pub fn wavelength_from_energy(energy_kev: f64) -> Result<f64> {
    if !energy_kev.is_finite() || energy_kev <= 0.0 {
        return Err(PressXrdError::NumericError(format!(
            "X-ray energy must be positive, got {} keV",
            energy_kev
        )));
    }
    Ok(PLANCK_EV_S * SPEED_OF_LIGHT_A_S / (energy_kev * 1000.0))
}

/// Bragg 定律求 d 间距（Å）
pub fn d_spacing(wavelength: f64, two_theta_deg: f64) -> Result<f64> {
    let sin_theta = (two_theta_deg.to_radians() / 2.0).sin();
    if sin_theta.is_nan() || sin_theta <= 0.0 {
        return Err(PressXrdError::NumericError(format!(
            "sin(θ) must be positive, got {} for 2θ = {}°",
            sin_theta, two_theta_deg
        )));
    }

    let d = wavelength / (2.0 * sin_theta);
    if !d.is_finite() {
        return Err(PressXrdError::NumericError(format!(
            "d-spacing is not finite for 2θ = {}°",
            two_theta_deg
        )));
    }
    Ok(d)
}

/// Holzapfel AP2 状态方程：原子体积 v（Å³）→ 压力（GPa）
pub fn holzapfel_pressure(v: f64, z: u32, eos: &EosParameters) -> f64 {
    let EosParameters { v0, k0, kp0 } = *eos;
    let z = z as f64;

    let x = (v / v0).powf(1.0 / 3.0);
    let pfg0 = AFG * (z / v0).powf(5.0 / 3.0);
    let c0 = -(3.0 * k0 / pfg0).ln();
    let c2 = 1.5 * (kp0 - 3.0) - c0;

    3.0 * k0 * (1.0 - x) / x.powi(5) * (c0 * (1.0 - x)).exp() * (1.0 + c2 * x * (1.0 - x))
}

/// 压力计算器
#[derive(Debug, Clone, Copy)]
pub struct PressureCalculator {
    calibrant: Calibrant,
    peak: BraggPeak,
    /// 2θ 零点偏移（度）
    tth_offset: f64,
}

impl PressureCalculator {
    /// 创建新的压力计算器
    pub fn new(calibrant: Calibrant, peak: BraggPeak) -> Self {
        Self {
            calibrant,
            peak,
            tth_offset: 0.0,
        }
    }

    /// 设置 2θ 零点偏移
    pub fn with_tth_offset(mut self, tth_offset: f64) -> Self {
        self.tth_offset = tth_offset;
        self
    }

    /// 由 2θ（度）计算原子体积（Å³）
    pub fn atomic_volume(&self, two_theta_deg: f64, energy_kev: f64) -> Result<f64> {
        let wavelength = wavelength_from_energy(energy_kev)?;
        let d = d_spacing(wavelength, two_theta_deg - self.tth_offset)?;
        let a = d * self.peak.lattice_factor();
        Ok(a.powi(3) / 4.0)
    }

    /// 计算压力（GPa）
    pub fn calculate(&self, two_theta_deg: f64, temperature: f64, energy_kev: f64) -> Result<f64> {
        let z = match self.calibrant {
            Calibrant::Au => self.calibrant.atomic_number(),
            Calibrant::Ag => {
                return Err(PressXrdError::NotImplemented(
                    "Ag calibrant is not set up yet".to_string(),
                ))
            }
        };

        let eos = table::load_eos_params(self.calibrant, temperature)?;
        let v = self.atomic_volume(two_theta_deg, energy_kev)?;
        let pressure = holzapfel_pressure(v, z, &eos);

        if !pressure.is_finite() {
            return Err(PressXrdError::NumericError(format!(
                "pressure is not finite for 2θ = {}°",
                two_theta_deg
            )));
        }
        Ok(pressure)
    }
}

/// 计算压力（GPa），标定物与衍射指数以文本给出
///
/// 检查顺序：标定物（Ag 直接返回未实现）→ 衍射指数 → 温度 → 几何。
pub fn calculate_pressure(
    tth_deg: f64,
    temperature: f64,
    energy_kev: f64,
    bragg_peak: &str,
    calibrant: &str,
    tth_offset_deg: f64,
) -> Result<f64> {
    let calibrant: Calibrant = calibrant.parse()?;
    if calibrant == Calibrant::Ag {
        return Err(PressXrdError::NotImplemented(
            "Ag calibrant is not set up yet".to_string(),
        ));
    }
    let peak: BraggPeak = bragg_peak.parse()?;

    PressureCalculator::new(calibrant, peak)
        .with_tth_offset(tth_offset_deg)
        .calculate(tth_deg, temperature, energy_kev)
}
