//! # 统一错误处理模块
//!
//! 定义 pressxrd 的所有错误类型，使用 `thiserror` 派生。
//! 核心计算（头解析、峰拟合、状态方程、压力计算）的每一类失败都有独立的变体，
//! 调用方按变体区分处理，不依赖错误字符串。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// pressxrd 统一错误类型
#[derive(Error, Debug)]
pub enum PressXrdError {
    // ─────────────────────────────────────────────────────────────
    // 核心计算错误
    // ─────────────────────────────────────────────────────────────
    #[error("Parse error: {reason}")]
    ParseError { reason: String },

    #[error("Temperature {value} K is outside the calibrated range {min}-{max} K")]
    RangeError { value: f64, min: f64, max: f64 },

    #[error("Invalid value: {0}")]
    ValidationError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Fit failed: {0}")]
    FitError(String),

    #[error("Numeric error: {0}")]
    NumericError(String),

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl PressXrdError {
    /// 构造解析错误
    pub fn parse(reason: impl Into<String>) -> Self {
        PressXrdError::ParseError {
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, PressXrdError>;
