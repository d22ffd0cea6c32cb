//! # 输电网络数据模型
//!
//! 线路表与潮流的统一数据结构。
//!
//! ## 数据来源
//! - CSV 线路表：`from_bus,to_bus,capacity,susceptance[,flow]`
//! - 可选的潮流表：`flow` 单列，按行号与线路表对齐，加载时一次性合并
//! - 内置 8 条线路的示例网络
//!
//! ## 依赖关系
//! - 被 `network/` 其他子模块和 `commands/network.rs` 使用
//! - 使用 `serde` + `csv` 读取表格

use crate::error::{GridUtilError, Result};

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// 母线标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(pub String);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BusId {
    fn from(s: &str) -> Self {
        BusId(s.to_string())
    }
}

impl From<u32> for BusId {
    fn from(n: u32) -> Self {
        BusId(n.to_string())
    }
}

/// 输电线路
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// 额定容量 (MW)
    pub capacity: f64,
    /// 电纳
    pub susceptance: f64,
}

/// 带潮流的线路
#[derive(Debug, Clone, PartialEq)]
pub struct LineFlow {
    pub line: Line,
    /// 有功潮流 (MW)，符号表示方向
    pub flow: f64,
}

impl LineFlow {
    pub fn abs_flow(&self) -> f64 {
        self.flow.abs()
    }

    pub fn congestion(&self) -> f64 {
        congestion(self.flow, self.line.capacity)
    }
}

/// 越限量：max(0, |flow| - capacity)
pub fn congestion(flow: f64, capacity: f64) -> f64 {
    (flow.abs() - capacity).max(0.0)
}

/// CSV 行
#[derive(Debug, Deserialize)]
struct LineRow {
    from_bus: String,
    to_bus: String,
    capacity: f64,
    susceptance: f64,
    #[serde(default)]
    flow: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    flow: f64,
}

/// 线路表（潮流可缺失）
#[derive(Debug, Clone, Default)]
pub struct LineTable {
    lines: Vec<Line>,
    flows: Vec<Option<f64>>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line, flow: Option<f64>) {
        self.lines.push(line);
        self.flows.push(flow);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// 合并为带潮流的线路，任何一行缺失潮流都会报错
    pub fn line_flows(&self) -> Result<Vec<LineFlow>> {
        self.lines
            .iter()
            .zip(&self.flows)
            .enumerate()
            .map(|(row, (line, flow))| match flow {
                Some(flow) => Ok(LineFlow {
                    line: line.clone(),
                    flow: *flow,
                }),
                None => Err(GridUtilError::MissingFlow { row: row + 1 }),
            })
            .collect()
    }

    /// 按行号合并独立的潮流表，行数必须一致
    pub fn join_flows(&mut self, flows: Vec<f64>) -> Result<()> {
        if flows.len() != self.lines.len() {
            return Err(GridUtilError::FlowCountMismatch {
                lines: self.lines.len(),
                flows: flows.len(),
            });
        }
        self.flows = flows.into_iter().map(Some).collect();
        Ok(())
    }
}

/// 读取 CSV 线路表
pub fn load_lines(path: &Path) -> Result<LineTable> {
    if !path.exists() {
        return Err(GridUtilError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut table = LineTable::new();
    for row in reader.deserialize() {
        let row: LineRow = row?;
        table.push(
            Line {
                from_bus: BusId(row.from_bus),
                to_bus: BusId(row.to_bus),
                capacity: row.capacity,
                susceptance: row.susceptance,
            },
            row.flow,
        );
    }

    Ok(table)
}

/// 读取单列潮流表
pub fn load_flows(path: &Path) -> Result<Vec<f64>> {
    if !path.exists() {
        return Err(GridUtilError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut flows = Vec::new();
    for row in reader.deserialize() {
        let row: FlowRow = row?;
        flows.push(row.flow);
    }
    Ok(flows)
}

/// 内置示例网络：8 条线路，容量 100 MW，电纳 1e4
pub fn sample_network() -> LineTable {
    const CAPACITY: f64 = 100.0;
    const SUSCEPTANCE: f64 = 1.0e4;

    let from_bus = [1, 5, 2, 6, 3, 7, 4, 8];
    let to_bus = [5, 6, 6, 7, 7, 8, 8, 5];
    let flows = [100.0, 5.0, 100.0, 105.0, -120.0, -15.0, -80.0, -95.0];

    let mut table = LineTable::new();
    for i in 0..from_bus.len() {
        table.push(
            Line {
                from_bus: BusId::from(from_bus[i] as u32),
                to_bus: BusId::from(to_bus[i] as u32),
                capacity: CAPACITY,
                susceptance: SUSCEPTANCE,
            },
            Some(flows[i]),
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_congestion() {
        assert_eq!(congestion(100.0, 100.0), 0.0);
        assert_eq!(congestion(120.0, 100.0), 20.0);
        assert_eq!(congestion(-120.0, 100.0), 20.0);
        assert_eq!(congestion(-15.0, 100.0), 0.0);
    }

    #[test]
    fn test_sample_network() {
        let table = sample_network();
        assert_eq!(table.len(), 8);
        assert!(table.line_flows().is_ok());

        let flows = table.line_flows().unwrap();
        assert_eq!(flows[4].line.from_bus, BusId::from("3"));
        assert_eq!(flows[4].line.to_bus, BusId::from("7"));
        assert_eq!(flows[4].flow, -120.0);
        assert_eq!(flows[4].congestion(), 20.0);
        assert_eq!(flows[3].congestion(), 5.0);
    }

    #[test]
    fn test_join_flows_checks_length() {
        let mut table = LineTable::new();
        table.push(
            Line {
                from_bus: BusId::from("a"),
                to_bus: BusId::from("b"),
                capacity: 10.0,
                susceptance: 1.0,
            },
            None,
        );
        assert!(matches!(
            table.line_flows(),
            Err(GridUtilError::MissingFlow { row: 1 })
        ));

        let err = table.join_flows(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            GridUtilError::FlowCountMismatch { lines: 1, flows: 2 }
        ));

        table.join_flows(vec![12.5]).unwrap();
        assert_eq!(table.line_flows().unwrap()[0].flow, 12.5);
    }

    #[test]
    fn test_load_csv_tables() {
        let dir = TempDir::new().unwrap();
        let lines_path = dir.path().join("lines.csv");
        fs::write(
            &lines_path,
            "from_bus,to_bus,capacity,susceptance,flow\n1,5,100,10000,100.0\nA, B ,50,200,\n",
        )
        .unwrap();

        let table = load_lines(&lines_path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lines()[1].to_bus, BusId::from("B"));
        assert!(table.line_flows().is_err());

        let flows_path = dir.path().join("flows.csv");
        fs::write(&flows_path, "flow\n1.5\n-3\n").unwrap();
        let flows = load_flows(&flows_path).unwrap();
        assert_eq!(flows, vec![1.5, -3.0]);
    }

    #[test]
    fn test_load_lines_without_flow_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(&path, "from_bus,to_bus,capacity,susceptance\n1,2,100,1e4\n").unwrap();
        let table = load_lines(&path).unwrap();
        assert_eq!(table.lines()[0].susceptance, 1.0e4);
        assert!(table.line_flows().is_err());
    }
}
