//! # 拟合图表生成
//!
//! 使用 `plotters` 库绘制扫描数据、拟合曲线与峰位标记。
//!
//! ## 功能
//! - 数据点（圆点连线）与拟合曲线（红色）叠加
//! - 峰位处的灰色竖线
//! - 坐标范围按数据两端各留 5% 余量
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 调用
//! - 使用 `models/peak.rs` 的 PeakParameters
//! - 使用 `plotters` 渲染图表

use crate::error::{PressXrdError, Result};
use crate::models::PeakParameters;

use plotters::prelude::*;
use std::path::Path;

/// 拟合曲线采样点数
const FIT_SAMPLES: usize = 500;

/// 图表内容
pub struct FitPlot<'a> {
    /// 观测 x
    pub x: &'a [f64],
    /// 观测 y
    pub y: &'a [f64],
    /// 拟合参数（未拟合时为空）
    pub fit: Option<&'a PeakParameters>,
    /// 标题
    pub title: &'a str,
    /// x 轴名称
    pub x_desc: &'a str,
    /// y 轴名称
    pub y_desc: &'a str,
    /// 附加说明（如压力）
    pub note: Option<String>,
}

/// 生成拟合图表，`use_svg` 为真时输出 SVG，否则输出 PNG
pub fn generate_fit_plot(
    plot: &FitPlot,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if plot.x.is_empty() {
        return Err(PressXrdError::InvalidArgument(
            "cannot plot an empty scan".to_string(),
        ));
    }

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_fit_chart(&root, plot)?;
        root.present()
            .map_err(|e| PressXrdError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_fit_chart(&root, plot)?;
        root.present()
            .map_err(|e| PressXrdError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 数据范围，两端各留 5% 余量
fn padded_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = (max - min).abs() * 0.05;
    if pad > 0.0 {
        (min - pad, max + pad)
    } else {
        (min - 1.0, max + 1.0)
    }
}

/// 绘制图表的核心逻辑
fn draw_fit_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    plot: &FitPlot,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

    let (x_min, x_max) = padded_range(plot.x);

    // 拟合曲线在数据范围内等距采样
    let fit_curve: Vec<(f64, f64)> = match plot.fit {
        Some(params) => {
            let lo = plot.x.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = plot.x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let step = (hi - lo) / (FIT_SAMPLES - 1) as f64;
            let xs: Vec<f64> = (0..FIT_SAMPLES).map(|i| lo + i as f64 * step).collect();
            let ys = params.evaluate(&xs);
            xs.into_iter().zip(ys).collect()
        }
        None => Vec::new(),
    };

    let all_y: Vec<f64> = plot
        .y
        .iter()
        .copied()
        .chain(fit_curve.iter().map(|(_, y)| *y))
        .collect();
    let (y_min, y_max) = padded_range(&all_y);

    let mut chart = ChartBuilder::on(root)
        .caption(plot.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(plot.x_desc)
        .y_desc(plot.y_desc)
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

    // 观测数据
    let data_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(
            plot.x.iter().zip(plot.y).map(|(x, y)| (*x, *y)),
            data_color.stroke_width(1),
        ))
        .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;
    chart
        .draw_series(
            plot.x
                .iter()
                .zip(plot.y)
                .map(|(x, y)| Circle::new((*x, *y), 3, data_color.filled())),
        )
        .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

    if let Some(params) = plot.fit {
        chart
            .draw_series(LineSeries::new(fit_curve.iter().copied(), RED.stroke_width(2)))
            .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

        // 峰位竖线
        let grey = RGBColor(128, 128, 128);
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(params.x0, y_min), (params.x0, y_max)],
                grey.stroke_width(1),
            )))
            .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;

        let label = format!("x0 = {:.4}", params.x0);
        chart
            .draw_series(std::iter::once(Text::new(
                label,
                (x_min + 0.03 * (x_max - x_min), y_max - 0.05 * (y_max - y_min)),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;
    }

    if let Some(note) = &plot.note {
        chart
            .draw_series(std::iter::once(Text::new(
                note.clone(),
                (x_min + 0.03 * (x_max - x_min), y_max - 0.12 * (y_max - y_min)),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(|e| PressXrdError::Other(format!("{:?}", e)))?;
    }

    Ok(())
}
