//! # 标定物状态方程参数表
//!
//! 金 (Au) 与银 (Ag) 在 0-500 K 的 V0, K0, K0' 参数，按温度分段线性插值。
//!
//! ## 数据来源
//! W. B. Holzapfel et al., J. Phys. Chem. Ref. Data 30, 515 (2001)
//!
//! ## 依赖关系
//! - 被 `eos/pressure.rs` 调用
//! - 纯静态数据，无外部依赖

use crate::error::{PressXrdError, Result};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 标定物
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calibrant {
    /// 金
    Au,
    /// 银
    Ag,
}

impl Calibrant {
    /// 原子序数
    pub fn atomic_number(&self) -> u32 {
        match self {
            Calibrant::Au => 79,
            Calibrant::Ag => 47,
        }
    }

    /// 参数表
    pub fn table(&self) -> &'static EosTable {
        match self {
            Calibrant::Au => &GOLD,
            Calibrant::Ag => &SILVER,
        }
    }
}

impl FromStr for Calibrant {
    type Err = PressXrdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Au" => Ok(Calibrant::Au),
            "Ag" => Ok(Calibrant::Ag),
            _ => Err(PressXrdError::ValidationError(format!(
                "Unknown calibrant '{}'. It must be \"Au\" or \"Ag\"",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Calibrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Calibrant::Au => write!(f, "Au"),
            Calibrant::Ag => write!(f, "Ag"),
        }
    }
}

/// 状态方程参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EosParameters {
    /// 参考原子体积 V0（Å³）
    pub v0: f64,
    /// 体模量 K0（GPa）
    pub k0: f64,
    /// 体模量压力导数 K0'
    pub kp0: f64,
}

/// 表格点数
const TABLE_LEN: usize = 12;

/// 温度 → (V0, K0, K0') 参数表
#[derive(Debug)]
pub struct EosTable {
    /// 温度节点（K，严格递增）
    pub temperatures: [f64; TABLE_LEN],
    pub v0: [f64; TABLE_LEN],
    pub k0: [f64; TABLE_LEN],
    pub kp0: [f64; TABLE_LEN],
}

const TEMPERATURES: [f64; TABLE_LEN] = [
    0.0, 10.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0,
];

/// 金
pub static GOLD: EosTable = EosTable {
    temperatures: TEMPERATURES,
    v0: [
        16.7905, 16.7906, 16.7984, 16.8238, 16.8550, 16.8885, 16.9232, 16.959, 16.9956, 17.0329,
        17.071, 17.1098,
    ],
    k0: [
        180.93, 180.93, 179.94, 177.51, 174.86, 172.16, 169.43, 166.7, 163.96, 161.21, 158.46,
        155.7,
    ],
    kp0: [
        6.08, 6.08, 6.09, 6.11, 6.13, 6.15, 6.17, 6.20, 6.23, 6.25, 6.28, 6.31,
    ],
};

/// 银（仅供查表，压力计算尚未启用）
pub static SILVER: EosTable = EosTable {
    temperatures: TEMPERATURES,
    v0: [
        16.8439, 16.8439, 16.8512, 16.8815, 16.9210, 16.9644, 17.0099, 17.057, 17.1055, 17.1553,
        17.2063, 17.2585,
    ],
    k0: [
        110.85, 110.85, 110.31, 108.68, 106.83, 104.91, 102.96, 101.0, 99.03, 97.05, 95.07, 93.07,
    ],
    kp0: [
        6.0, 6.0, 6.01, 6.03, 6.05, 6.08, 6.12, 6.15, 6.19, 6.22, 6.26, 6.3,
    ],
};

impl EosTable {
    /// 温度定义域 (min, max)
    pub fn domain(&self) -> (f64, f64) {
        (self.temperatures[0], self.temperatures[TABLE_LEN - 1])
    }

    /// 在给定温度插值
    pub fn interpolate(&self, temperature: f64) -> Result<EosParameters> {
        let (min, max) = self.domain();
        if !(min..=max).contains(&temperature) {
            return Err(PressXrdError::RangeError {
                value: temperature,
                min,
                max,
            });
        }

        // 节点上直接返回表值
        if let Some(i) = self.temperatures.iter().position(|&t| t == temperature) {
            return Ok(EosParameters {
                v0: self.v0[i],
                k0: self.k0[i],
                kp0: self.kp0[i],
            });
        }

        // temperature 严格位于某个区间 (t[i-1], t[i]) 内
        let i = self.temperatures.partition_point(|&t| t < temperature);
        let (t_lo, t_hi) = (self.temperatures[i - 1], self.temperatures[i]);
        let frac = (temperature - t_lo) / (t_hi - t_lo);
        let lerp = |values: &[f64; TABLE_LEN]| values[i - 1] + frac * (values[i] - values[i - 1]);

        Ok(EosParameters {
            v0: lerp(&self.v0),
            k0: lerp(&self.k0),
            kp0: lerp(&self.kp0),
        })
    }
}

/// 查询标定物在给定温度下的状态方程参数
pub fn load_eos_params(calibrant: Calibrant, temperature: f64) -> Result<EosParameters> {
    calibrant.table().interpolate(temperature)
}
