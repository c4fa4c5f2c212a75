//! # 扫描数据
//!
//! 单次扫描的列数据容器，以及从文本文件读取扫描。
//!
//! ## 文件格式
//! ```text
//! #S 12  ascan  tth 10 12 200 1
//! #X Control: 301.2K Sample: 299.8K
//! #U Energy: 10234.5eV
//! tth,Monitor,Detector
//! 10.00,100012,35
//! 10.01,100020,37
//! ```
//! 以 `#` 开头的行构成原始文件头，第一行非注释行为列名，其后为数值。
//!
//! ## 依赖关系
//! - 被 `commands/fit.rs`, `commands/calibrate.rs` 使用
//! - 使用 `csv` 读取列数据

use crate::error::{PressXrdError, Result};

use std::fs;
use std::path::Path;

/// 单次扫描：列名 → 数值数组，以及原始文件头
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// 扫描名称（通常为文件名）
    pub name: String,
    /// 原始文件头文本
    pub header: String,
    /// 列名（文件顺序）
    labels: Vec<String>,
    /// 列数据，与 `labels` 一一对应
    columns: Vec<Vec<f64>>,
}

impl Scan {
    /// 由列数据构造扫描
    pub fn from_columns(
        name: impl Into<String>,
        header: impl Into<String>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        let mut scan = Scan {
            name: name.into(),
            header: header.into(),
            ..Default::default()
        };

        let expected = columns.first().map(|(_, c)| c.len());
        for (label, data) in columns {
            if Some(data.len()) != expected {
                return Err(PressXrdError::ValidationError(format!(
                    "column '{}' has {} points, expected {}",
                    label,
                    data.len(),
                    expected.unwrap_or(0)
                )));
            }
            if scan.labels.contains(&label) {
                return Err(PressXrdError::ValidationError(format!(
                    "duplicate column '{}'",
                    label
                )));
            }
            scan.labels.push(label);
            scan.columns.push(data);
        }

        Ok(scan)
    }

    /// 列名列表
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 数据点数
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按名称取列
    pub fn column(&self, label: &str) -> Result<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| {
                PressXrdError::ValidationError(format!(
                    "column '{}' not found in scan '{}' (available: {})",
                    label,
                    self.name,
                    self.labels.join(", ")
                ))
            })
    }

    /// 第一列名称（默认 x）
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// 最后一列名称（默认 y）
    pub fn last_label(&self) -> Option<&str> {
        self.labels.last().map(String::as_str)
    }

    /// 提取 (x, y)，可选按监视器列逐点归一化
    pub fn xy(
        &self,
        x_label: &str,
        y_label: &str,
        norm_label: Option<&str>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let x = self.column(x_label)?.to_vec();
        let mut y = self.column(y_label)?.to_vec();

        if let Some(norm_label) = norm_label {
            let monitor = self.column(norm_label)?;
            for (i, (yi, m)) in y.iter_mut().zip(monitor).enumerate() {
                if *m == 0.0 {
                    return Err(PressXrdError::NumericError(format!(
                        "normalization column '{}' is zero at point {}",
                        norm_label, i
                    )));
                }
                *yi /= m;
            }
        }

        Ok((x, y))
    }
}

/// 读取扫描文件
pub fn parse_scan_file(path: &Path, delimiter: u8) -> Result<Scan> {
    let content = fs::read_to_string(path).map_err(|e| PressXrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scan");

    parse_scan_content(&content, name, delimiter).map_err(|e| match e {
        PressXrdError::ParseError { reason } => {
            PressXrdError::parse(format!("{}: {}", path.display(), reason))
        }
        other => other,
    })
}

/// 从文本内容解析扫描
pub fn parse_scan_content(content: &str, name: &str, delimiter: u8) -> Result<Scan> {
    let header = content
        .lines()
        .filter(|l| l.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let labels: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if labels.is_empty() || labels.iter().all(String::is_empty) {
        return Err(PressXrdError::parse("missing column header row"));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            PressXrdError::parse(format!("data row {}: {}", row_idx + 1, e))
        })?;
        for (col_idx, cell) in record.iter().enumerate() {
            let value: f64 = cell.parse().map_err(|_| {
                PressXrdError::parse(format!(
                    "data row {}: non-numeric value '{}' in column '{}'",
                    row_idx + 1,
                    cell,
                    labels[col_idx]
                ))
            })?;
            columns[col_idx].push(value);
        }
    }

    Scan::from_columns(name, header, labels.into_iter().zip(columns).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONTENT: &str = "#S 12  ascan  tth 10 12 4 1
#X Control: 301.2K Sample: 299.8K
#U Energy: 10234.5eV
tth, Monitor, Detector
10.0, 1000, 50
10.5, 2000, 300
11.0, 1000, 40
";

    #[test]
    fn test_parse_scan_content() {
        let scan = parse_scan_content(CONTENT, "scan12", b',').unwrap();
        assert_eq!(scan.labels(), &["tth", "Monitor", "Detector"]);
        assert_eq!(scan.len(), 3);
        assert_eq!(scan.first_label(), Some("tth"));
        assert_eq!(scan.last_label(), Some("Detector"));
        assert!(scan.header.starts_with("#S 12"));
        assert!(scan.header.contains("#X Control: 301.2K"));
        assert!(!scan.header.contains("tth, Monitor"));
        assert_eq!(scan.column("tth").unwrap(), &[10.0, 10.5, 11.0]);
    }

    #[test]
    fn test_xy_with_normalization() {
        let scan = parse_scan_content(CONTENT, "scan12", b',').unwrap();
        let (x, y) = scan.xy("tth", "Detector", Some("Monitor")).unwrap();
        assert_eq!(x, vec![10.0, 10.5, 11.0]);
        assert_eq!(y, vec![0.05, 0.15, 0.04]);

        let (_, raw) = scan.xy("tth", "Detector", None).unwrap();
        assert_eq!(raw, vec![50.0, 300.0, 40.0]);
    }

    #[test]
    fn test_xy_zero_monitor() {
        let scan = Scan::from_columns(
            "s",
            "",
            vec![
                ("x".to_string(), vec![1.0, 2.0]),
                ("y".to_string(), vec![3.0, 4.0]),
                ("m".to_string(), vec![1.0, 0.0]),
            ],
        )
        .unwrap();
        match scan.xy("x", "y", Some("m")) {
            Err(PressXrdError::NumericError(msg)) => assert!(msg.contains("point 1")),
            other => panic!("expected NumericError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column() {
        let scan = parse_scan_content(CONTENT, "scan12", b',').unwrap();
        match scan.xy("tth", "Counts", None) {
            Err(PressXrdError::ValidationError(msg)) => {
                assert!(msg.contains("Counts"));
                assert!(msg.contains("tth, Monitor, Detector"));
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let result = Scan::from_columns(
            "s",
            "",
            vec![
                ("x".to_string(), vec![1.0, 2.0]),
                ("y".to_string(), vec![3.0]),
            ],
        );
        assert!(matches!(result, Err(PressXrdError::ValidationError(_))));
    }

    #[test]
    fn test_non_numeric_cell() {
        let content = "tth,Detector\n10.0,abc\n";
        match parse_scan_content(content, "bad", b',') {
            Err(PressXrdError::ParseError { reason }) => {
                assert!(reason.contains("row 1"));
                assert!(reason.contains("Detector"));
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row() {
        let content = "tth,Monitor,Detector\n10.0,1000,50\n10.5,2000\n";
        match parse_scan_content(content, "ragged", b',') {
            Err(PressXrdError::ParseError { reason }) => assert!(reason.contains("row 2")),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_scan_file_tab_delimited() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "#U Energy: 10000eV\ntth\tDetector\n20.0\t1.5\n20.1\t2.5\n"
        )
        .unwrap();

        let scan = parse_scan_file(file.path(), b'\t').unwrap();
        assert_eq!(scan.len(), 2);
        assert_eq!(scan.column("Detector").unwrap(), &[1.5, 2.5]);
        assert_eq!(scan.header, "#U Energy: 10000eV");
    }

    #[test]
    fn test_parse_scan_file_missing() {
        let result = parse_scan_file(Path::new("/nonexistent/scan.csv"), b',');
        assert!(matches!(result, Err(PressXrdError::FileReadError { .. })));
    }
}
