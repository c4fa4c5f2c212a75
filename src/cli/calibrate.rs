//! # calibrate 子命令 CLI 定义
//!
//! 输入为单个扫描文件或包含扫描文件的目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 复用 `cli/fit.rs` 与 `cli/pressure.rs` 的参数组
//! - 参数传递给 `commands/calibrate.rs`

use super::fit::{ProfileArgs, ScanArgs};
use super::pressure::CalibrantArgs;

use clap::Args;
use std::path::PathBuf;

/// calibrate 子命令参数
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Input: scan file or directory containing scan files
    pub input: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    #[command(flatten)]
    pub calibrant: CalibrantArgs,

    /// Header temperature label used for the EOS lookup
    #[arg(long, env = "PRESSXRD_TEMP_SOURCE", default_value = "Sample")]
    pub temp_source: String,

    /// Temperature in K (overrides the scan header)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// X-ray energy in keV (overrides the scan header)
    #[arg(short, long)]
    pub energy: Option<f64>,

    /// Results CSV (batch mode default: <input>/pressure_results.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for per-scan fit plots (PNG)
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for scan files (batch mode, e.g., "*.csv,*.dat")
    #[arg(long, default_value = "*.csv,*.dat,*.txt")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Commands};

    use clap::Parser;

    #[test]
    fn test_parse_calibrate_overrides() {
        let cli = Cli::try_parse_from([
            "pressxrd", "calibrate", "scans/", "--temp-source", "Cold", "-t", "295", "-j", "4",
            "--recursive",
        ])
        .unwrap();

        match cli.command {
            Commands::Calibrate(args) => {
                assert_eq!(args.temp_source, "Cold");
                assert_eq!(args.temperature, Some(295.0));
                assert_eq!(args.energy, None);
                assert_eq!(args.jobs, 4);
                assert!(args.recursive);
                assert_eq!(args.pattern, "*.csv,*.dat,*.txt");
            }
            _ => panic!("expected calibrate command"),
        }
    }
}
