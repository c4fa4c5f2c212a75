//! # pressxrd 命令行入口
//!
//! ## 子命令
//! - `pressure`  - 由 2θ 计算压力
//! - `fit`       - 单个扫描的峰拟合
//! - `calibrate` - 拟合 + 压力标定（单文件或批量）

use clap::Parser;
use pressxrd::cli::Cli;
use pressxrd::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
