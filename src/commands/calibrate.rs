//! # calibrate 命令实现
//!
//! 拟合扫描峰位并换算为压力。
//!
//! ## 功能
//! - 支持单文件和批量目录处理
//! - 并行计算（rayon）
//! - 温度/能量来自扫描头，可由命令行覆盖
//! - 结果汇总表格与 CSV 导出
//! - 可选每个扫描的拟合图
//!
//! ## 依赖关系
//! - 使用 `cli/calibrate.rs` 定义的参数
//! - 使用 `commands/fit.rs` 的 `fit_scan`
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `eos/`, `parsers/`, `report/`

use crate::batch::{BatchResult, BatchRunner, FileCollector, ProcessResult};
use crate::cli::calibrate::CalibrateArgs;
use crate::cli::fit::{ProfileArgs, ScanArgs};
use crate::commands::fit::{fit_scan, ScanFit, StartOverrides};
use crate::eos::{BraggPeak, Calibrant, PressureCalculator};
use crate::error::{PressXrdError, Result};
use crate::models::CalibrationRecord;
use crate::parsers::{self, lookup_temperature, parse_energy, parse_temperatures, Scan};
use crate::report::{export, generate_fit_plot, FitPlot};
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 批量结果文件名
const DEFAULT_RESULTS_NAME: &str = "pressure_results.csv";

/// 标定配置（各扫描共享，只读）
struct CalibrationConfig {
    scan: ScanArgs,
    profile: ProfileArgs,
    calibrant: Calibrant,
    peak: BraggPeak,
    tth_offset: f64,
    temp_source: String,
    temperature: Option<f64>,
    energy: Option<f64>,
    plot_dir: Option<PathBuf>,
}

impl CalibrationConfig {
    fn from_args(args: &CalibrateArgs) -> Self {
        Self {
            scan: args.scan.clone(),
            profile: args.profile.clone(),
            calibrant: args.calibrant.calibrant.into(),
            peak: args.calibrant.peak.into(),
            tth_offset: args.calibrant.tth_offset,
            temp_source: args.temp_source.clone(),
            temperature: args.temperature,
            energy: args.energy,
            plot_dir: args.plot_dir.clone(),
        }
    }

    /// 温度（K）与其来源；命令行覆盖时来源为空
    fn resolve_temperature(&self, scan: &Scan) -> Result<(Option<String>, f64)> {
        if let Some(t) = self.temperature {
            return Ok((None, t));
        }
        let temperatures = parse_temperatures(&scan.header)?;
        let t = lookup_temperature(&temperatures, &self.temp_source)?;
        Ok((Some(self.temp_source.clone()), t))
    }

    /// 能量（keV）
    fn resolve_energy(&self, scan: &Scan) -> Result<f64> {
        match self.energy {
            Some(e) => Ok(e),
            None => Ok(parse_energy(&scan.header)? / 1000.0),
        }
    }
}

/// 对已读入的扫描执行 拟合 → 压力
fn calibrate_scan(scan: &Scan, config: &CalibrationConfig) -> Result<(CalibrationRecord, ScanFit)> {
    let (source, temperature) = config.resolve_temperature(scan)?;
    let energy = config.resolve_energy(scan)?;

    let fit = fit_scan(scan, &config.scan, &config.profile, &StartOverrides::default())?;

    let pressure = PressureCalculator::new(config.calibrant, config.peak)
        .with_tth_offset(config.tth_offset)
        .calculate(fit.outcome.params.x0, temperature, energy)?;

    let record = CalibrationRecord::new(
        scan.name.clone(),
        &fit.outcome.params,
        source,
        temperature,
        energy,
        config.calibrant,
        config.peak,
        config.tth_offset,
        pressure,
    );

    if let Some(ref dir) = config.plot_dir {
        save_scan_plot(scan, &fit, &record, dir)?;
    }

    Ok((record, fit))
}

/// 处理单个扫描文件（批量模式的处理单元）
fn process_file(path: &Path, config: &CalibrationConfig) -> ProcessResult<CalibrationRecord> {
    let display = path.display().to_string();

    let scan = match parsers::parse_scan_file(path, config.scan.delimiter) {
        Ok(scan) => scan,
        Err(e) => return ProcessResult::Failed(display, e.to_string()),
    };
    if scan.is_empty() {
        return ProcessResult::Skipped(display);
    }

    match calibrate_scan(&scan, config) {
        Ok((record, _)) => ProcessResult::Success(record),
        Err(e) => ProcessResult::Failed(display, e.to_string()),
    }
}

/// 执行 calibrate 命令
pub fn execute(args: CalibrateArgs) -> Result<()> {
    output::print_header("Pressure Calibration");

    if args.input.is_file() {
        execute_single_file(&args)
    } else if args.input.is_dir() {
        execute_batch(&args)
    } else {
        Err(PressXrdError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 单文件模式
fn execute_single_file(args: &CalibrateArgs) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    ensure_plot_dir(args)?;
    let config = CalibrationConfig::from_args(args);
    let scan = parsers::parse_scan_file(&args.input, config.scan.delimiter)?;
    if scan.is_empty() {
        return Err(PressXrdError::ValidationError(format!(
            "scan '{}' contains no data points",
            scan.name
        )));
    }

    let (record, fit) = calibrate_scan(&scan, &config)?;

    output::print_info(&format!(
        "x0 = {:.5}° (FWHM {:.5}°, alpha {:.3}) from '{}' vs '{}'",
        record.x0,
        fit.outcome.params.fwhm(),
        record.alpha,
        fit.y_label,
        fit.x_label
    ));
    output::print_info(&format!(
        "T = {:.2} K ({}), E = {:.4} keV",
        record.temperature_k,
        record.temperature_source.as_deref().unwrap_or("command line"),
        record.energy_kev
    ));
    output::print_pressure(&record.scan, record.pressure_gpa);

    if let Some(ref path) = args.output {
        export::records_to_csv(std::slice::from_ref(&record), path)?;
        output::print_success(&format!("Result saved to '{}'", path.display()));
    }

    Ok(())
}

/// 批量输入
struct BatchSource<'a> {
    input: &'a Path,
    pattern: &'a str,
    recursive: bool,
    jobs: usize,
}

/// 收集并标定目录中的扫描，写出结果 CSV
///
/// 结果文件本身（以及输入目录中的默认结果文件）不会被当作扫描收集。
/// 没有匹配文件时返回 `None`。
fn calibrate_directory(
    batch: &BatchSource,
    output_path: &Path,
    config: &CalibrationConfig,
) -> Result<Option<BatchResult<CalibrationRecord>>> {
    let files = FileCollector::new(batch.input.to_path_buf())
        .with_pattern(batch.pattern)?
        .recursive(batch.recursive)
        .exclude(output_path)
        .exclude(&batch.input.join(DEFAULT_RESULTS_NAME))
        .collect();

    if files.is_empty() {
        return Ok(None);
    }

    output::print_info(&format!("Found {} scan files", files.len()));

    // 并行处理
    let runner = BatchRunner::new(batch.jobs);
    let result = runner.run(&files, |file| process_file(file, config))?;

    print_summary_table(&result.records);

    if !result.records.is_empty() {
        export::records_to_csv(&result.records, output_path)?;
        output::print_success(&format!("Results saved to '{}'", output_path.display()));
    }

    Ok(Some(result))
}

/// 批量处理模式
fn execute_batch(args: &CalibrateArgs) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    ensure_plot_dir(args)?;
    let config = CalibrationConfig::from_args(args);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.join(DEFAULT_RESULTS_NAME));
    let batch = BatchSource {
        input: &args.input,
        pattern: &args.pattern,
        recursive: args.recursive,
        jobs: args.jobs,
    };

    let result = match calibrate_directory(&batch, &output_path, &config)? {
        Some(result) => result,
        None => {
            output::print_warning(&format!(
                "No matching files found with pattern '{}'",
                args.pattern
            ));
            return Ok(());
        }
    };

    // 打印统计
    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} success, {} skipped, {} failed",
        result.success(),
        result.skipped,
        result.failed()
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 确保图表目录存在
fn ensure_plot_dir(args: &CalibrateArgs) -> Result<()> {
    if let Some(ref dir) = args.plot_dir {
        fs::create_dir_all(dir).map_err(|e| PressXrdError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// 保存单个扫描的拟合图
fn save_scan_plot(scan: &Scan, fit: &ScanFit, record: &CalibrationRecord, dir: &Path) -> Result<()> {
    let path = dir.join(format!("{}.png", scan.name));

    let plot = FitPlot {
        x: &fit.x,
        y: &fit.y,
        fit: Some(&fit.outcome.params),
        title: &scan.name,
        x_desc: &fit.x_label,
        y_desc: &fit.y_label,
        note: Some(format!(
            "P = {:.2} GPa at {:.1} K",
            record.pressure_gpa, record.temperature_k
        )),
    };
    generate_fit_plot(&plot, &path, 1000, 700, false)
}

/// 打印批量结果表格
fn print_summary_table(records: &[CalibrationRecord]) {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Scan")]
        scan: String,
        #[tabled(rename = "2θ (°)")]
        x0: String,
        #[tabled(rename = "T (K)")]
        temperature: String,
        #[tabled(rename = "E (keV)")]
        energy: String,
        #[tabled(rename = "P (GPa)")]
        pressure: String,
    }

    let rows: Vec<SummaryRow> = records
        .iter()
        .map(|r| SummaryRow {
            scan: r.scan.clone(),
            x0: format!("{:.5}", r.x0),
            temperature: format!("{:.2}", r.temperature_k),
            energy: format!("{:.4}", r.energy_kev),
            pressure: format!("{:.2}", r.pressure_gpa),
        })
        .collect();

    if !rows.is_empty() {
        output::print_header(&format!("Calibration Results ({} scans)", rows.len()));
        let table = Table::new(&rows);
        println!("{}", table);
    }
}
