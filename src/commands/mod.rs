//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `fitting/`, `eos/`, `report/`, `utils/`
//! - 子模块: pressure, fit, calibrate

pub mod calibrate;
pub mod fit;
pub mod pressure;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Pressure(args) => pressure::execute(args),
        Commands::Fit(args) => fit::execute(args),
        Commands::Calibrate(args) => calibrate::execute(args),
    }
}
