//! # 结果导出
//!
//! 导出拟合曲线与压力标定结果。
//!
//! ## 支持格式
//! - CSV: 标定结果表（每次扫描一行），或拟合曲线（x, y, fit, residual）
//! - XY: 带注释头的拟合曲线数据
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 调用
//! - 使用 `models/` 的 CalibrationRecord, PeakParameters
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{PressXrdError, Result};
use crate::models::{CalibrationRecord, PeakParameters};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn write_error(path: &Path) -> impl Fn(std::io::Error) -> PressXrdError + '_ {
    move |e| PressXrdError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

/// 导出标定结果为 CSV 格式
pub fn records_to_csv(records: &[CalibrationRecord], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for record in records {
        wtr.serialize(record)?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出拟合曲线为 CSV 格式
pub fn fit_to_csv(x: &[f64], y: &[f64], params: &PeakParameters, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    wtr.write_record(["x", "y", "fit", "residual"])?;

    let fit = params.evaluate(x);
    for ((xi, yi), fi) in x.iter().zip(y).zip(&fit) {
        wtr.write_record(&[
            format!("{:.6}", xi),
            format!("{:.6e}", yi),
            format!("{:.6e}", fi),
            format!("{:.6e}", yi - fi),
        ])?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出拟合曲线为 XY 格式
pub fn fit_to_xy(
    x: &[f64],
    y: &[f64],
    params: &PeakParameters,
    scan_name: &str,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let mut out = BufWriter::new(file);
    let err = write_error(output_path);

    writeln!(out, "# Scan: {}", scan_name).map_err(&err)?;
    writeln!(
        out,
        "# Pseudo-Voigt: x0 = {:.6}, sigma = {:.6}, amplitude = {:.6e}, constant = {:.6e}, alpha = {:.4}",
        params.x0, params.sigma, params.amplitude, params.constant, params.alpha
    )
    .map_err(&err)?;
    writeln!(out, "# Columns: x, y (observed), fit").map_err(&err)?;
    writeln!(out, "#").map_err(&err)?;

    let fit = params.evaluate(x);
    for ((xi, yi), fi) in x.iter().zip(y).zip(&fit) {
        writeln!(out, "{:.6}\t{:.6e}\t{:.6e}", xi, yi, fi).map_err(&err)?;
    }

    out.flush().map_err(&err)?;
    Ok(())
}
