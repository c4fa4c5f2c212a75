//! # 峰形参数数据模型
//!
//! 赝 Voigt 峰的五个参数，以及三种峰形预设。
//!
//! ## 依赖关系
//! - 被 `fitting/` 和 `commands/` 使用
//! - 使用 `fitting/profile.rs` 求值

use crate::fitting::profile;

use serde::{Deserialize, Serialize};

/// 赝 Voigt 峰参数
///
/// 参数向量顺序固定为 `[x0, sigma, amplitude, constant, alpha]`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParameters {
    /// 峰位 x0（通常为 2θ，度）
    pub x0: f64,
    /// 峰宽 sigma（Lorentz 分量的半高半宽）
    pub sigma: f64,
    /// 积分强度
    pub amplitude: f64,
    /// 常数背底
    pub constant: f64,
    /// Lorentz 分量比例，0 为纯 Gauss，1 为纯 Lorentz
    pub alpha: f64,
}

impl PeakParameters {
    pub fn new(x0: f64, sigma: f64, amplitude: f64, constant: f64, alpha: f64) -> Self {
        Self {
            x0,
            sigma,
            amplitude,
            constant,
            alpha,
        }
    }

    /// 转为参数向量
    pub fn to_array(&self) -> [f64; 5] {
        [self.x0, self.sigma, self.amplitude, self.constant, self.alpha]
    }

    /// 由参数向量构造
    pub fn from_array(p: [f64; 5]) -> Self {
        Self::new(p[0], p[1], p[2], p[3], p[4])
    }

    /// 在给定 x 上求值
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        profile::pseudo_voigt(x, self.x0, self.sigma, self.amplitude, self.constant, self.alpha)
    }

    /// 半高全宽
    ///
    /// Gauss 分量宽度经过 `sqrt(2 ln 2)` 缩放，两个分量的半高全宽都等于 2·sigma。
    pub fn fwhm(&self) -> f64 {
        2.0 * self.sigma.abs()
    }
}

/// 峰形预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProfileShape {
    /// Gauss 与 Lorentz 混合，alpha 参与拟合
    #[default]
    PseudoVoigt,
    /// 纯 Gauss，alpha 固定为 0
    Gaussian,
    /// 纯 Lorentz，alpha 固定为 1
    Lorentzian,
}

impl ProfileShape {
    /// alpha 初值（固定峰形时即为固定值）
    pub fn default_alpha(&self) -> f64 {
        match self {
            ProfileShape::PseudoVoigt => 0.5,
            ProfileShape::Gaussian => 0.0,
            ProfileShape::Lorentzian => 1.0,
        }
    }

    /// alpha 是否参与拟合
    pub fn fits_alpha(&self) -> bool {
        matches!(self, ProfileShape::PseudoVoigt)
    }
}

impl std::fmt::Display for ProfileShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileShape::PseudoVoigt => write!(f, "pseudo-voigt"),
            ProfileShape::Gaussian => write!(f, "gaussian"),
            ProfileShape::Lorentzian => write!(f, "lorentzian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_order() {
        let p = PeakParameters::new(1.0, 2.0, 3.0, 4.0, 0.5);
        assert_eq!(p.to_array(), [1.0, 2.0, 3.0, 4.0, 0.5]);
        assert_eq!(PeakParameters::from_array(p.to_array()), p);
    }

    #[test]
    fn test_fwhm_is_half_maximum_width() {
        for alpha in [0.0, 0.3, 1.0] {
            let p = PeakParameters::new(20.0, 0.05, 2.0, 0.0, alpha);
            let peak = p.evaluate(&[20.0])[0];
            let edge = p.evaluate(&[20.0 + p.fwhm() / 2.0])[0];
            assert!((edge / peak - 0.5).abs() < 1e-12, "alpha = {}", alpha);
        }
    }

    #[test]
    fn test_shape_presets() {
        assert!(ProfileShape::PseudoVoigt.fits_alpha());
        assert!(!ProfileShape::Gaussian.fits_alpha());
        assert_eq!(ProfileShape::Gaussian.default_alpha(), 0.0);
        assert_eq!(ProfileShape::Lorentzian.default_alpha(), 1.0);
        assert_eq!(ProfileShape::default().default_alpha(), 0.5);
    }
}
