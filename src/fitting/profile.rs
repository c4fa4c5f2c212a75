//! # 赝 Voigt 峰形
//!
//! ## 公式
//! ```text
//! sigma_g = sigma / sqrt(2 ln 2)
//! G(x) = (1-alpha) * A / (sigma_g sqrt(2π)) * exp(-(x-x0)² / (2 sigma_g²))
//! L(x) = alpha * A / π * sigma / ((x-x0)² + sigma²)
//! f(x) = G(x) + L(x) + constant
//! ```
//! 两个分量共享峰位、名义宽度 sigma 和积分强度 A，alpha 线性混合。
//!
//! ## 依赖关系
//! - 被 `fitting/fitter.rs` 和 `models/peak.rs` 使用
//! - 无外部依赖

use std::f64::consts::{LN_2, PI};

/// sqrt(2 ln 2)：Lorentz 半高半宽到 Gauss 标准差的换算因子
fn gauss_scale() -> f64 {
    (2.0 * LN_2).sqrt()
}

/// 单点求值
pub fn pseudo_voigt_at(x: f64, x0: f64, sigma: f64, amplitude: f64, constant: f64, alpha: f64) -> f64 {
    let sigma_g = sigma / gauss_scale();
    let dx = x - x0;

    let gauss = (1.0 - alpha) * amplitude / (sigma_g * (2.0 * PI).sqrt())
        * (-dx * dx / (2.0 * sigma_g * sigma_g)).exp();
    let lorentz = alpha * amplitude / PI * sigma / (dx * dx + sigma * sigma);

    gauss + lorentz + constant
}

/// 对一组 x 求值
pub fn pseudo_voigt(x: &[f64], x0: f64, sigma: f64, amplitude: f64, constant: f64, alpha: f64) -> Vec<f64> {
    x.iter()
        .map(|&xi| pseudo_voigt_at(xi, x0, sigma, amplitude, constant, alpha))
        .collect()
}

/// 对五个参数的偏导数，顺序为 `[x0, sigma, amplitude, constant, alpha]`
pub fn pseudo_voigt_gradient(x: f64, params: &[f64; 5]) -> [f64; 5] {
    let [x0, sigma, amplitude, _constant, alpha] = *params;
    let k = gauss_scale();
    let dx = x - x0;
    let dx2 = dx * dx;
    let s2 = sigma * sigma;

    // 单位强度的 Gauss / Lorentz 形状
    let g_unit = k / (sigma * (2.0 * PI).sqrt()) * (-dx2 * k * k / (2.0 * s2)).exp();
    let denom = dx2 + s2;
    let l_unit = sigma / (PI * denom);

    let gauss = (1.0 - alpha) * amplitude * g_unit;

    let d_x0 = gauss * dx * k * k / s2 + alpha * amplitude / PI * 2.0 * sigma * dx / (denom * denom);
    let d_sigma = gauss * (dx2 * k * k / (s2 * sigma) - 1.0 / sigma)
        + alpha * amplitude / PI * (dx2 - s2) / (denom * denom);
    let d_amplitude = (1.0 - alpha) * g_unit + alpha * l_unit;
    let d_alpha = amplitude * (l_unit - g_unit);

    [d_x0, d_sigma, d_amplitude, 1.0, d_alpha]
}
