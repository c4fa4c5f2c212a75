//! # 单峰拟合器
//!
//! 用赝 Voigt 峰形对 (2θ, 强度) 数据做非线性最小二乘拟合，
//! 求解器为 `levenberg-marquardt`（MINPACK lmder 移植）。
//!
//! ## 初值
//! 未给出初值时使用启发式估计：
//! - 宽度 = (max x - min x) / 10
//! - 峰位 = 强度最大值首次出现处的 x
//! - 强度 = max y · 宽度 · sqrt(π / ln 2)
//! - 背底 = y[0]
//!
//! 前提：窗口内只有一个主峰，且其最大值落在窗口内。多峰或单调背底不做处理。
//!
//! ## 约束
//! 求解器在无约束的内部坐标上迭代（MINUIT 变换）：
//! - sigma = MIN_SIGMA - 1 + sqrt(s² + 1)，保证 sigma >= MIN_SIGMA
//! - alpha = (sin v + 1) / 2，保证 alpha ∈ [0, 1]
//!
//! 收敛后峰位必须落在数据窗口内，宽度不能贴在下限或超过窗口，否则视为拟合失败。
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 调用
//! - 使用 `fitting/profile.rs` 的峰形与偏导数
//! - 使用 `levenberg-marquardt` 与 `nalgebra` 求解

use crate::error::{PressXrdError, Result};
use crate::fitting::profile;
use crate::models::{PeakParameters, ProfileShape};

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};
use std::f64::consts::{LN_2, PI};

/// sigma 下限
const MIN_SIGMA: f64 = 1e-12;

/// 贴近下限的判定阈值
const COLLAPSED_SIGMA: f64 = 1e-9;

/// 拟合 alpha 时初值离开边界的距离（边界处内部坐标导数为零）
const ALPHA_MARGIN: f64 = 1e-3;

/// 求解器设置
#[derive(Debug, Clone, Copy)]
pub struct LevMarSettings {
    /// 代价相对下降容差
    pub ftol: f64,
    /// 相对步长容差
    pub xtol: f64,
    /// 梯度正交性容差
    pub gtol: f64,
    /// 最多 patience·(n+1) 次函数求值
    pub patience: usize,
}

impl Default for LevMarSettings {
    fn default() -> Self {
        LevMarSettings {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            patience: 200,
        }
    }
}

/// 拟合结果
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// 拟合参数
    pub params: PeakParameters,
    /// 残差平方和
    pub residual_sum_squares: f64,
    /// 函数求值次数
    pub evaluations: usize,
    /// 数据点数
    pub points: usize,
    /// 自由参数个数
    pub free_params: usize,
}

impl FitOutcome {
    /// 约化卡方（残差平方和 / 自由度）
    pub fn reduced_chi_square(&self) -> f64 {
        let dof = self.points.saturating_sub(self.free_params);
        if dof == 0 {
            f64::NAN
        } else {
            self.residual_sum_squares / dof as f64
        }
    }
}

fn sigma_from_internal(s: f64) -> f64 {
    MIN_SIGMA - 1.0 + (s * s + 1.0).sqrt()
}

fn sigma_to_internal(sigma: f64) -> f64 {
    let t = sigma.max(MIN_SIGMA) - MIN_SIGMA + 1.0;
    (t * t - 1.0).sqrt()
}

fn alpha_from_internal(v: f64) -> f64 {
    (v.sin() + 1.0) / 2.0
}

fn alpha_to_internal(alpha: f64) -> f64 {
    (2.0 * alpha.clamp(0.0, 1.0) - 1.0).asin()
}

/// 峰拟合的最小二乘问题，参数以内部坐标保存
struct PeakProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    /// `Some` 时 alpha 固定，只拟合前四个参数
    fixed_alpha: Option<f64>,
    /// 内部坐标 [x0, s, amplitude, constant, (v)]
    internal: DVector<f64>,
}

impl<'a> PeakProblem<'a> {
    fn new(x: &'a [f64], y: &'a [f64], fixed_alpha: Option<f64>, start: &PeakParameters) -> Self {
        let mut internal = vec![
            start.x0,
            sigma_to_internal(start.sigma),
            start.amplitude,
            start.constant,
        ];
        if fixed_alpha.is_none() {
            let alpha = start.alpha.clamp(ALPHA_MARGIN, 1.0 - ALPHA_MARGIN);
            internal.push(alpha_to_internal(alpha));
        }
        Self {
            x,
            y,
            fixed_alpha,
            internal: DVector::from_vec(internal),
        }
    }

    /// 内部坐标 → 物理参数
    fn physical(&self) -> PeakParameters {
        let p = &self.internal;
        let alpha = match self.fixed_alpha {
            Some(alpha) => alpha,
            None => alpha_from_internal(p[4]),
        };
        PeakParameters::new(p[0], sigma_from_internal(p[1]), p[2], p[3], alpha)
    }

    fn residual_vector(&self) -> DVector<f64> {
        let p = self.physical();
        DVector::from_iterator(
            self.x.len(),
            self.x.iter().zip(self.y).map(|(&xi, &yi)| {
                profile::pseudo_voigt_at(xi, p.x0, p.sigma, p.amplitude, p.constant, p.alpha) - yi
            }),
        )
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for PeakProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, p: &DVector<f64>) {
        self.internal.copy_from(p);
    }

    fn params(&self) -> DVector<f64> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let r = self.residual_vector();
        r.iter().all(|v| v.is_finite()).then_some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let full = self.physical().to_array();
        let n = self.internal.len();

        // 链式法则：物理参数对内部坐标的导数
        let s = self.internal[1];
        let d_sigma = s / (s * s + 1.0).sqrt();
        let d_alpha = if n == 5 {
            self.internal[4].cos() / 2.0
        } else {
            0.0
        };

        let mut jac = DMatrix::zeros(self.x.len(), n);
        for (i, &xi) in self.x.iter().enumerate() {
            let grad = profile::pseudo_voigt_gradient(xi, &full);
            jac[(i, 0)] = grad[0];
            jac[(i, 1)] = grad[1] * d_sigma;
            jac[(i, 2)] = grad[2];
            jac[(i, 3)] = grad[3];
            if n == 5 {
                jac[(i, 4)] = grad[4] * d_alpha;
            }
        }
        jac.iter().all(|v| v.is_finite()).then_some(jac)
    }
}

/// 检查拟合输入
fn validate_data(x: &[f64], y: &[f64], min_points: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(PressXrdError::ValidationError(format!(
            "x and y must have the same length ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < min_points {
        return Err(PressXrdError::ValidationError(format!(
            "at least {} points are required, got {}",
            min_points,
            x.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(PressXrdError::ValidationError(
            "data contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// 收敛结果必须描述窗口内的一个峰
fn check_located(params: &PeakParameters, x: &[f64]) -> Result<()> {
    let (x_min, x_max) = (min_of(x), max_of(x));

    if !params.to_array().iter().all(|v| v.is_finite()) {
        return Err(PressXrdError::FitError(
            "fitted parameters are not finite".to_string(),
        ));
    }
    if !(x_min..=x_max).contains(&params.x0) {
        return Err(PressXrdError::FitError(format!(
            "fitted peak position {} lies outside the scan window [{}, {}]",
            params.x0, x_min, x_max
        )));
    }
    if params.sigma <= COLLAPSED_SIGMA {
        return Err(PressXrdError::FitError(format!(
            "fitted width collapsed to {}",
            params.sigma
        )));
    }
    if params.sigma > x_max - x_min {
        return Err(PressXrdError::FitError(format!(
            "fitted width {} exceeds the scan window {}",
            params.sigma,
            x_max - x_min
        )));
    }
    Ok(())
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// 自动初值估计
pub fn initial_guess(x: &[f64], y: &[f64], alpha: f64) -> Result<PeakParameters> {
    validate_data(x, y, 1)?;

    let width = (max_of(x) - min_of(x)) / 10.0;
    let y_max = max_of(y);
    let peak_idx = y.iter().position(|&v| v == y_max).unwrap_or(0);

    Ok(PeakParameters::new(
        x[peak_idx],
        width,
        y_max * width * (PI / LN_2).sqrt(),
        y[0],
        alpha,
    ))
}

/// 按扫描窗口给出的手动编辑初值
///
/// 峰位取窗口中点，宽度取范围的 1/6，强度取最大值，
/// 背底取前 5 点与后 5 点均值的平均。
pub fn window_seed(x: &[f64], y: &[f64], alpha: f64) -> Result<PeakParameters> {
    validate_data(x, y, 1)?;

    let (x_min, x_max) = (min_of(x), max_of(x));
    let edge = y.len().min(5);
    let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
    let baseline = (mean(&y[..edge]) + mean(&y[y.len() - edge..])) / 2.0;

    Ok(PeakParameters::new(
        (x_max + x_min) / 2.0,
        ((x_max - x_min) / 6.0).abs(),
        max_of(y),
        baseline,
        alpha,
    ))
}

/// 拟合单个赝 Voigt 峰
///
/// `fit_alpha` 为 false 时 alpha 固定为 `alpha_guess`，返回值中的 alpha 与之完全相同。
pub fn fit_peak(
    x: &[f64],
    y: &[f64],
    p0: Option<PeakParameters>,
    fit_alpha: bool,
    alpha_guess: f64,
) -> Result<PeakParameters> {
    let mut fitter = PeakFitter::new(ProfileShape::PseudoVoigt)
        .with_alpha(alpha_guess)
        .fit_alpha(fit_alpha);
    if let Some(p0) = p0 {
        fitter = fitter.with_start(p0);
    }
    fitter.fit(x, y).map(|outcome| outcome.params)
}

/// 峰拟合器
#[derive(Debug, Clone)]
pub struct PeakFitter {
    /// alpha 是否参与拟合
    fit_alpha: bool,
    /// alpha 初值或固定值
    alpha: f64,
    /// 显式初值
    start: Option<PeakParameters>,
    /// 求解器设置
    settings: LevMarSettings,
}

impl PeakFitter {
    /// 按峰形预设创建拟合器
    pub fn new(shape: ProfileShape) -> Self {
        Self {
            fit_alpha: shape.fits_alpha(),
            alpha: shape.default_alpha(),
            start: None,
            settings: LevMarSettings::default(),
        }
    }

    /// 设置 alpha 初值（固定峰形时为固定值）
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// 设置 alpha 是否参与拟合
    pub fn fit_alpha(mut self, fit_alpha: bool) -> Self {
        self.fit_alpha = fit_alpha;
        self
    }

    /// 设置显式初值
    pub fn with_start(mut self, start: PeakParameters) -> Self {
        self.start = Some(start);
        self
    }

    /// 设置求解器参数
    pub fn with_settings(mut self, settings: LevMarSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 执行拟合
    pub fn fit(&self, x: &[f64], y: &[f64]) -> Result<FitOutcome> {
        let free_params = if self.fit_alpha { 5 } else { 4 };
        validate_data(x, y, free_params)?;

        let start = match self.start {
            Some(p) => p,
            None => initial_guess(x, y, self.alpha)?,
        };

        let problem = PeakProblem::new(x, y, (!self.fit_alpha).then_some(self.alpha), &start);
        if problem.residuals().is_none() {
            return Err(PressXrdError::FitError(
                "model is not finite at the starting parameters".to_string(),
            ));
        }

        let s = &self.settings;
        let (problem, report) = LevenbergMarquardt::new()
            .with_ftol(s.ftol)
            .with_xtol(s.xtol)
            .with_gtol(s.gtol)
            .with_patience(s.patience)
            .minimize(problem);

        if !report.termination.was_successful() {
            return Err(PressXrdError::FitError(format!(
                "solver stopped without converging after {} evaluations: {:?}",
                report.number_of_evaluations, report.termination
            )));
        }

        let params = problem.physical();
        check_located(&params, x)?;

        Ok(FitOutcome {
            params,
            residual_sum_squares: problem.residual_vector().norm_squared(),
            evaluations: report.number_of_evaluations,
            points: x.len(),
            free_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(rng: &mut StdRng, sd: f64) -> f64 {
        // Box-Muller
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen();
        sd * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn synthetic_on(
        x: Vec<f64>,
        truth: &PeakParameters,
        sd: f64,
        rng: &mut StdRng,
    ) -> (Vec<f64>, Vec<f64>) {
        let y = truth
            .evaluate(&x)
            .into_iter()
            .map(|v| v + noise(rng, sd))
            .collect();
        (x, y)
    }

    fn synthetic(truth: &PeakParameters, sd: f64, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..201).map(|i| 14.0 + i as f64 * 0.01).collect();
        synthetic_on(x, truth, sd, &mut StdRng::seed_from_u64(seed))
    }

    fn assert_close(actual: f64, expected: f64, rel: f64, name: &str) {
        assert!(
            (actual - expected).abs() <= rel * expected.abs(),
            "{}: fitted {} vs true {}",
            name,
            actual,
            expected
        );
    }

    #[test]
    fn test_initial_guess() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [0.5, 1.0, 4.0, 4.0, 1.0, 0.5];
        let p = initial_guess(&x, &y, 0.3).unwrap();
        assert_eq!(p.x0, 3.0);
        assert_eq!(p.sigma, 0.5);
        assert!((p.amplitude - 4.0 * 0.5 * (PI / LN_2).sqrt()).abs() < 1e-12);
        assert_eq!(p.constant, 0.5);
        assert_eq!(p.alpha, 0.3);
    }

    #[test]
    fn test_window_seed() {
        let x: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let mut y = vec![1.0; 12];
        y[6] = 9.0;
        y[11] = 3.0;
        let p = window_seed(&x, &y, 0.5).unwrap();
        assert_eq!(p.x0, 15.5);
        assert!((p.sigma - 11.0 / 6.0).abs() < 1e-12);
        assert_eq!(p.amplitude, 9.0);
        // 前 5 点均值 1.0，后 5 点均值 1.4
        assert!((p.constant - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_internal_coordinates() {
        for sigma in [1e-6, 0.02, 0.5, 40.0] {
            assert!((sigma_from_internal(sigma_to_internal(sigma)) - sigma).abs() < 1e-9 * sigma.max(1.0));
        }
        for alpha in [0.0, 0.25, 0.5, 1.0] {
            assert!((alpha_from_internal(alpha_to_internal(alpha)) - alpha).abs() < 1e-12);
        }
        for s in [-1e6, -3.0, 0.0, 2.0, 1e6] {
            assert!(sigma_from_internal(s) >= MIN_SIGMA);
        }
        for v in [-10.0, -1.0, 0.3, 7.0] {
            assert!((0.0..=1.0).contains(&alpha_from_internal(v)));
        }
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let truth = PeakParameters::new(15.0, 0.08, 2.0, 0.3, 0.4);
        let (x, y) = synthetic(&truth, 0.0, 1);
        let start = PeakParameters::new(15.02, 0.1, 1.7, 0.25, 0.6);
        let mut problem = PeakProblem::new(&x, &y, None, &start);

        let jac = problem.jacobian().unwrap();
        let base = problem.params();
        let h = 1e-6;
        for j in 0..base.len() {
            let mut plus = base.clone();
            plus[j] += h;
            problem.set_params(&plus);
            let r_plus = problem.residuals().unwrap();

            let mut minus = base.clone();
            minus[j] -= h;
            problem.set_params(&minus);
            let r_minus = problem.residuals().unwrap();

            for i in (0..x.len()).step_by(10) {
                let numeric = (r_plus[i] - r_minus[i]) / (2.0 * h);
                assert!(
                    (numeric - jac[(i, j)]).abs() <= 1e-5 * (1.0 + numeric.abs()),
                    "param {} at x = {}: {} vs {}",
                    j,
                    x[i],
                    numeric,
                    jac[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_recovers_pseudo_voigt() {
        let truth = PeakParameters::new(15.03, 0.08, 2.0, 0.5, 0.35);
        let (x, y) = synthetic(&truth, 0.002, 7);

        let fitted = fit_peak(&x, &y, None, true, 0.5).unwrap();

        assert_close(fitted.x0, truth.x0, 0.01, "x0");
        assert_close(fitted.sigma, truth.sigma, 0.01, "sigma");
        assert_close(fitted.amplitude, truth.amplitude, 0.01, "amplitude");
        assert_close(fitted.constant, truth.constant, 0.01, "constant");
        assert_close(fitted.alpha, truth.alpha, 0.01, "alpha");
    }

    #[test]
    fn test_random_peaks_recovered_or_rejected() {
        let mut rng = StdRng::seed_from_u64(2024);
        let x: Vec<f64> = (0..401).map(|i| 14.0 + i as f64 * 0.005).collect();
        let (x_min, x_max) = (14.0, 16.0);

        let cases = 120;
        let mut recovered = 0;
        for case in 0..cases {
            let truth = PeakParameters::new(
                rng.gen_range(14.6..15.4),
                // 最窄为窗口的 1/100
                rng.gen_range(0.02..0.15),
                rng.gen_range(0.5..3.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.1..0.9),
            );
            let (x, y) = synthetic_on(x.clone(), &truth, 2.5e-4, &mut rng);

            match fit_peak(&x, &y, None, true, 0.5) {
                Ok(fitted) => {
                    assert!(
                        (x_min..=x_max).contains(&fitted.x0),
                        "case {}: x0 {} outside window",
                        case,
                        fitted.x0
                    );
                    assert!(
                        (fitted.x0 - truth.x0).abs() <= 0.01 * truth.sigma,
                        "case {}: x0 {} vs {}",
                        case,
                        fitted.x0,
                        truth.x0
                    );
                    assert_close(fitted.sigma, truth.sigma, 0.01, "sigma");
                    assert_close(fitted.amplitude, truth.amplitude, 0.01, "amplitude");
                    assert!((fitted.constant - truth.constant).abs() < 0.01, "case {}", case);
                    assert!((fitted.alpha - truth.alpha).abs() < 0.01, "case {}", case);
                    recovered += 1;
                }
                Err(PressXrdError::FitError(_)) => {}
                Err(other) => panic!("case {}: unexpected error {:?}", case, other),
            }
        }
        assert!(recovered * 4 >= cases * 3, "only {} of {} recovered", recovered, cases);
    }

    #[test]
    fn test_fixed_alpha_is_preserved() {
        let truth = PeakParameters::new(15.0, 0.1, 1.5, 0.2, 0.0);
        let (x, y) = synthetic(&truth, 0.001, 11);

        let gauss = fit_peak(&x, &y, None, false, 0.0).unwrap();
        assert_eq!(gauss.alpha, 0.0);
        assert_close(gauss.x0, 15.0, 0.001, "x0");
        assert_close(gauss.sigma, 0.1, 0.01, "sigma");

        let mixed = fit_peak(&x, &y, None, false, 0.3).unwrap();
        assert_eq!(mixed.alpha, 0.3);
    }

    #[test]
    fn test_explicit_start() {
        let truth = PeakParameters::new(15.0, 0.1, 1.5, 0.2, 1.0);
        let (x, y) = synthetic(&truth, 0.001, 3);

        let seed = window_seed(&x, &y, 1.0).unwrap();
        let outcome = PeakFitter::new(ProfileShape::Lorentzian)
            .with_start(seed)
            .fit(&x, &y)
            .unwrap();

        assert_eq!(outcome.params.alpha, 1.0);
        assert_eq!(outcome.free_params, 4);
        assert_eq!(outcome.points, 201);
        assert_close(outcome.params.x0, 15.0, 0.001, "x0");
        assert!(outcome.reduced_chi_square() < 1e-5);
    }

    #[test]
    fn test_bounds_hold() {
        let truth = PeakParameters::new(15.0, 0.1, 1.5, 0.2, 1.0);
        let (x, y) = synthetic(&truth, 0.001, 5);
        let fitted = fit_peak(&x, &y, None, true, 0.5).unwrap();
        assert!(fitted.sigma > 0.0);
        assert!((0.0..=1.0).contains(&fitted.alpha));
    }

    #[test]
    fn test_unlocated_peak_is_fit_error() {
        let x: Vec<f64> = (0..11).map(|i| 14.0 + i as f64 * 0.2).collect();

        let outside = PeakParameters::new(-1.1e6, 2385.6, 2.65e9, 0.0, 0.5);
        assert!(matches!(
            check_located(&outside, &x),
            Err(PressXrdError::FitError(_))
        ));

        let collapsed = PeakParameters::new(15.0, MIN_SIGMA, 1.0, 0.0, 0.5);
        assert!(matches!(
            check_located(&collapsed, &x),
            Err(PressXrdError::FitError(_))
        ));

        let too_wide = PeakParameters::new(15.0, 5.0, 1.0, 0.0, 0.5);
        assert!(matches!(
            check_located(&too_wide, &x),
            Err(PressXrdError::FitError(_))
        ));

        let fine = PeakParameters::new(15.0, 0.05, 1.0, 0.0, 0.5);
        assert!(check_located(&fine, &x).is_ok());
    }

    #[test]
    fn test_exhausted_budget_is_fit_error() {
        let truth = PeakParameters::new(15.03, 0.08, 2.0, 0.5, 0.35);
        let (x, y) = synthetic(&truth, 0.002, 9);
        let result = PeakFitter::new(ProfileShape::PseudoVoigt)
            .with_settings(LevMarSettings {
                patience: 1,
                ..Default::default()
            })
            .fit(&x, &y);
        assert!(matches!(result, Err(PressXrdError::FitError(_))));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            fit_peak(&[1.0, 2.0], &[1.0], None, true, 0.5),
            Err(PressXrdError::ValidationError(_))
        ));
        assert!(matches!(
            fit_peak(&[1.0, 2.0, 3.0], &[1.0, 2.0, 1.0], None, true, 0.5),
            Err(PressXrdError::ValidationError(_))
        ));
        assert!(matches!(
            fit_peak(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, f64::NAN, 1.0, 1.0, 1.0], None, true, 0.5),
            Err(PressXrdError::ValidationError(_))
        ));
    }
}
