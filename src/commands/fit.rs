//! # fit 命令实现
//!
//! 对单个扫描拟合赝 Voigt 峰。
//!
//! ## 功能
//! - 列选择与监视器归一化
//! - 峰形预设与手动初值
//! - 参数表格输出
//! - 可选图表 (PNG/SVG) 与曲线导出 (CSV/XY)
//!
//! ## 依赖关系
//! - 使用 `cli/fit.rs` 定义的参数
//! - 使用 `parsers/`, `fitting/`, `report/`
//! - `fit_scan` 被 `commands/calibrate.rs` 复用

use crate::cli::fit::{FitArgs, ProfileArgs, ScanArgs, SeedArg};
use crate::error::{PressXrdError, Result};
use crate::fitting::{initial_guess, window_seed, FitOutcome, PeakFitter};
use crate::models::{PeakParameters, ProfileShape};
use crate::parsers::{self, Scan};
use crate::report::{export, generate_fit_plot, FitPlot};
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 手动初值覆盖
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOverrides {
    pub x0: Option<f64>,
    pub sigma: Option<f64>,
    pub amplitude: Option<f64>,
    pub constant: Option<f64>,
}

impl StartOverrides {
    fn is_empty(&self) -> bool {
        self.x0.is_none() && self.sigma.is_none() && self.amplitude.is_none() && self.constant.is_none()
    }

    fn apply(&self, mut p: PeakParameters) -> PeakParameters {
        p.x0 = self.x0.unwrap_or(p.x0);
        p.sigma = self.sigma.unwrap_or(p.sigma);
        p.amplitude = self.amplitude.unwrap_or(p.amplitude);
        p.constant = self.constant.unwrap_or(p.constant);
        p
    }
}

/// 单个扫描的拟合结果
pub struct ScanFit {
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub outcome: FitOutcome,
}

/// 选择列并拟合单个扫描
pub fn fit_scan(
    scan: &Scan,
    scan_args: &ScanArgs,
    profile: &ProfileArgs,
    overrides: &StartOverrides,
) -> Result<ScanFit> {
    let x_label = match &scan_args.x_column {
        Some(label) => label.clone(),
        None => scan.first_label().map(str::to_string).ok_or_else(|| {
            PressXrdError::ValidationError(format!("scan '{}' has no columns", scan.name))
        })?,
    };
    let y_label = match &scan_args.y_column {
        Some(label) => label.clone(),
        None => scan.last_label().map(str::to_string).ok_or_else(|| {
            PressXrdError::ValidationError(format!("scan '{}' has no columns", scan.name))
        })?,
    };

    let (x, y) = scan.xy(&x_label, &y_label, scan_args.norm_column.as_deref())?;

    let shape: ProfileShape = profile.shape.into();
    let alpha = profile.alpha.unwrap_or_else(|| shape.default_alpha());
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PressXrdError::ValidationError(format!(
            "alpha must lie in [0, 1], got {}",
            alpha
        )));
    }

    let mut fitter = PeakFitter::new(shape).with_alpha(alpha);

    // 自动估计为默认初值；仅当显式要求窗口估计或给出覆盖值时才设置起点
    if profile.seed == SeedArg::Window || !overrides.is_empty() {
        let seed = match profile.seed {
            SeedArg::Peak => initial_guess(&x, &y, alpha)?,
            SeedArg::Window => window_seed(&x, &y, alpha)?,
        };
        fitter = fitter.with_start(overrides.apply(seed));
    }

    let outcome = fitter.fit(&x, &y)?;

    Ok(ScanFit {
        x_label,
        y_label,
        x,
        y,
        outcome,
    })
}

/// 执行 fit 命令
pub fn execute(args: FitArgs) -> Result<()> {
    output::print_header("Pseudo-Voigt Peak Fit");

    if !args.input.is_file() {
        return Err(PressXrdError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let scan = parsers::parse_scan_file(&args.input, args.scan.delimiter)?;
    output::print_info(&format!(
        "Scan '{}': {} points, columns [{}]",
        scan.name,
        scan.len(),
        scan.labels().join(", ")
    ));

    let overrides = StartOverrides {
        x0: args.x0,
        sigma: args.sigma,
        amplitude: args.amplitude,
        constant: args.constant,
    };

    let fit = fit_scan(&scan, &args.scan, &args.profile, &overrides)?;
    output::print_success(&format!(
        "Fit of '{}' vs '{}' converged after {} evaluations",
        fit.y_label, fit.x_label, fit.outcome.evaluations
    ));

    print_parameter_table(&fit.outcome);

    if let Some(ref path) = args.plot {
        let plot = FitPlot {
            x: &fit.x,
            y: &fit.y,
            fit: Some(&fit.outcome.params),
            title: &scan.name,
            x_desc: &fit.x_label,
            y_desc: &fit.y_label,
            note: None,
        };
        generate_fit_plot(&plot, path, args.width, args.height, is_svg(path))?;
        output::print_success(&format!("Plot saved to '{}'", path.display()));
    }

    if let Some(ref path) = args.export {
        match extension(path).as_deref() {
            Some("xy") => export::fit_to_xy(&fit.x, &fit.y, &fit.outcome.params, &scan.name, path)?,
            _ => export::fit_to_csv(&fit.x, &fit.y, &fit.outcome.params, path)?,
        }
        output::print_success(&format!("Fitted curve saved to '{}'", path.display()));
    }

    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// 按扩展名判断是否输出 SVG
pub fn is_svg(path: &Path) -> bool {
    extension(path).as_deref() == Some("svg")
}

/// 打印拟合参数表格
fn print_parameter_table(outcome: &FitOutcome) {
    #[derive(Tabled)]
    struct ParamRow {
        #[tabled(rename = "Parameter")]
        name: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let p = &outcome.params;
    let rows = vec![
        ParamRow { name: "x0", value: format!("{:.6}", p.x0) },
        ParamRow { name: "sigma", value: format!("{:.6}", p.sigma) },
        ParamRow { name: "FWHM", value: format!("{:.6}", p.fwhm()) },
        ParamRow { name: "amplitude", value: format!("{:.6e}", p.amplitude) },
        ParamRow { name: "constant", value: format!("{:.6e}", p.constant) },
        ParamRow { name: "alpha", value: format!("{:.4}", p.alpha) },
        ParamRow { name: "RSS", value: format!("{:.6e}", outcome.residual_sum_squares) },
        ParamRow { name: "reduced χ²", value: format!("{:.6e}", outcome.reduced_chi_square()) },
    ];

    let table = Table::new(&rows);
    println!("{}", table);
}
