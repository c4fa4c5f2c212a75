//! # 解析器模块
//!
//! 提供扫描文件头与扫描列数据的解析。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 子模块: header, scan

pub mod header;
pub mod scan;

pub use header::{lookup_temperature, parse_energy, parse_temperatures, HeaderMetadata};
pub use scan::{parse_scan_file, Scan};
