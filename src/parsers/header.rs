//! # 扫描文件头解析器
//!
//! 从仪器扫描文件的文本头中提取温度与 X 射线能量。
//!
//! ## 格式
//! - 温度记录行以 `#X` 开头，之后为交替的 (名称, 数值) 对：
//!   `#X Control: 301.2K Sample: 299.8K`
//! - 能量取自第一行包含 `Energy` 的记录，位于 `Energy:` 与 `eV` 之间：
//!   `#U Energy: 10234.5eV`
//!
//! ## 依赖关系
//! - 被 `parsers/scan.rs`, `commands/calibrate.rs` 使用
//! - 使用 `regex` 提取能量数值

use crate::error::{PressXrdError, Result};

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// 温度记录行标记
const TEMPERATURE_MARKER: &str = "#X";

/// `Energy:` 与 `eV` 之间的文本；缺少 `eV` 时取到行尾
static ENERGY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Energy:(.*?)(?:eV|$)").expect("valid energy regex"));

/// 扫描头元数据（温度源 → 温度，以及 X 射线能量）
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMetadata {
    /// 温度（K），键为头中出现的原始名称
    pub temperatures: BTreeMap<String, f64>,
    /// X 射线能量（eV）
    pub energy_ev: f64,
}

impl HeaderMetadata {
    /// 解析完整的扫描头
    pub fn parse(header: &str) -> Result<Self> {
        Ok(Self {
            temperatures: parse_temperatures(header)?,
            energy_ev: parse_energy(header)?,
        })
    }

    /// 能量（keV）
    pub fn energy_kev(&self) -> f64 {
        self.energy_ev / 1000.0
    }

    /// 按名称查找温度
    pub fn temperature(&self, source: &str) -> Result<f64> {
        lookup_temperature(&self.temperatures, source)
    }
}

/// 在已解析的温度映射中查找指定来源
pub fn lookup_temperature(temperatures: &BTreeMap<String, f64>, source: &str) -> Result<f64> {
    temperatures.get(source).copied().ok_or_else(|| {
        let known: Vec<&str> = temperatures.keys().map(String::as_str).collect();
        PressXrdError::ValidationError(format!(
            "Unknown temperature source '{}' (header provides: {})",
            source,
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        ))
    })
}

/// 解析所有 `#X` 温度记录
///
/// 多行记录累积到同一映射中，同名键以后出现者为准。
pub fn parse_temperatures(header: &str) -> Result<BTreeMap<String, f64>> {
    let mut temperatures = BTreeMap::new();

    for (idx, line) in header.lines().enumerate() {
        let Some(body) = line.strip_prefix(TEMPERATURE_MARKER) else {
            continue;
        };

        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(PressXrdError::parse(format!(
                "odd number of tokens in temperature record at line {}: '{}'",
                idx + 1,
                line
            )));
        }

        for pair in tokens.chunks(2) {
            let label = pair[0].trim_end_matches(':');
            let raw = pair[1].trim_end_matches('K');
            let value: f64 = raw.parse().map_err(|_| {
                PressXrdError::parse(format!(
                    "invalid temperature '{}' for '{}' at line {}: '{}'",
                    pair[1],
                    label,
                    idx + 1,
                    line
                ))
            })?;
            temperatures.insert(label.to_string(), value);
        }
    }

    Ok(temperatures)
}

/// 解析 X 射线能量（eV）
pub fn parse_energy(header: &str) -> Result<f64> {
    let (idx, line) = header
        .lines()
        .enumerate()
        .find(|(_, line)| line.contains("Energy"))
        .ok_or_else(|| PressXrdError::parse("no 'Energy' record found in header"))?;

    let captures = ENERGY_PATTERN.captures(line).ok_or_else(|| {
        PressXrdError::parse(format!(
            "energy record at line {} lacks 'Energy:': '{}'",
            idx + 1,
            line
        ))
    })?;

    let raw = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    raw.parse::<f64>().map_err(|_| {
        PressXrdError::parse(format!(
            "invalid energy '{}' at line {}: '{}'",
            raw,
            idx + 1,
            line
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "#S 12  ascan  tth 10 12 200 1\n\
#D Tue Mar 13 10:21:44 2018\n\
#X Control: 301.2K Sample: 299.8K\n\
#U Energy: 10234.5eV  Mono: Si(111)\n\
#L tth  Monitor  Detector";

    #[test]
    fn test_parse_temperatures() {
        let temps = parse_temperatures("#X Control: 301.2K Sample: 299.8K").unwrap();
        assert_eq!(temps.len(), 2);
        assert_eq!(temps["Control"], 301.2);
        assert_eq!(temps["Sample"], 299.8);
    }

    #[test]
    fn test_parse_temperatures_accumulates_lines() {
        let header = "#X Control: 301.2K Sample: 299.8K\n#C comment\n#X Sample: 10.5K Cryostat: 4.2K";
        let temps = parse_temperatures(header).unwrap();
        assert_eq!(temps.len(), 3);
        assert_eq!(temps["Control"], 301.2);
        assert_eq!(temps["Sample"], 10.5);
        assert_eq!(temps["Cryostat"], 4.2);
    }

    #[test]
    fn test_parse_temperatures_ignores_other_lines() {
        let header = "#S 1 ascan\n # X not a record\n#x lower case";
        assert!(parse_temperatures(header).unwrap().is_empty());
    }

    #[test]
    fn test_parse_temperatures_odd_tokens() {
        let header = "#S 1\n#X Control: 301.2K Sample:";
        match parse_temperatures(header) {
            Err(PressXrdError::ParseError { reason }) => {
                assert!(reason.contains("line 2"), "{}", reason);
                assert!(reason.contains("Sample:"), "{}", reason);
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_temperatures_bad_value() {
        let result = parse_temperatures("#X Control: warmK");
        assert!(matches!(result, Err(PressXrdError::ParseError { .. })));
    }

    #[test]
    fn test_parse_energy() {
        assert_eq!(parse_energy(HEADER).unwrap(), 10234.5);
        assert_eq!(
            parse_energy("#U slit 0.2 Energy: 10234.5eV gap").unwrap(),
            10234.5
        );
    }

    #[test]
    fn test_parse_energy_missing() {
        let result = parse_energy("#S 1\n#X Control: 300K");
        assert!(matches!(result, Err(PressXrdError::ParseError { .. })));
    }

    #[test]
    fn test_parse_energy_first_line_wins() {
        let header = "#U EnergyScale on\n#U Energy: 10000eV";
        assert!(matches!(
            parse_energy(header),
            Err(PressXrdError::ParseError { .. })
        ));
    }

    #[test]
    fn test_header_metadata() {
        let meta = HeaderMetadata::parse(HEADER).unwrap();
        assert!((meta.energy_kev() - 10.2345).abs() < 1e-12);
        assert_eq!(meta.temperature("Sample").unwrap(), 299.8);
        match meta.temperature("Stage") {
            Err(PressXrdError::ValidationError(msg)) => {
                assert!(msg.contains("Control, Sample"), "{}", msg)
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }
}
