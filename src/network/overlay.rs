//! # 边着色叠加层
//!
//! 四种视图共用一个能力："边颜色来源"。
//!
//! | 视图 | 边值 | 色条范围 | 颜色映射 |
//! |------|------|----------|----------|
//! | plain | 无（灰色，标注电纳） | 无 | 无 |
//! | signed flow | flow | [min, max] | RdYlGn 反向 |
//! | absolute flow | \|flow\| | [min, max] | RdYlGn 反向 |
//! | congestion | max(0, \|flow\| - capacity) | 固定 [0, 1] | Reds |
//!
//! 边颜色按边值自身的 [min, max] 归一化；拥塞视图的色条范围与数据无关。
//!
//! ## 依赖关系
//! - 被 `commands/network.rs`, `network/plot.rs` 使用
//! - 使用 `network/graph.rs`, `network/colormap.rs`

use crate::error::{GridUtilError, Result};
use crate::network::colormap::{normalize, Colormap};
use crate::network::graph::{EdgeValues, TransmissionGraph};
use crate::network::model::LineFlow;

use plotters::style::RGBColor;

/// 未着色边的颜色
pub const PLAIN_EDGE: RGBColor = RGBColor(128, 128, 128);

/// 边颜色来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeColorSource {
    Plain,
    SignedFlow,
    AbsoluteFlow,
    Congestion,
}

/// 色条
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBar {
    pub colormap: Colormap,
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
}

/// 一次渲染所需的边样式，顺序与图中边一致
#[derive(Debug, Clone)]
pub struct EdgeOverlay {
    pub colors: Vec<RGBColor>,
    pub labels: Vec<String>,
    pub colorbar: Option<ColorBar>,
}

impl EdgeColorSource {
    pub const ALL: [EdgeColorSource; 4] = [
        EdgeColorSource::Plain,
        EdgeColorSource::SignedFlow,
        EdgeColorSource::AbsoluteFlow,
        EdgeColorSource::Congestion,
    ];

    /// 输出文件名后缀
    pub fn slug(self) -> &'static str {
        match self {
            EdgeColorSource::Plain => "plain",
            EdgeColorSource::SignedFlow => "flow",
            EdgeColorSource::AbsoluteFlow => "abs-flow",
            EdgeColorSource::Congestion => "congestion",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EdgeColorSource::Plain => "Transmission Network",
            _ => "Transmission Network with Power Flows",
        }
    }

    /// 默认图幅 (像素)
    pub fn default_size(self) -> (u32, u32) {
        match self {
            EdgeColorSource::Plain => (800, 600),
            _ => (1400, 1200),
        }
    }

    pub fn needs_flows(self) -> bool {
        self != EdgeColorSource::Plain
    }

    pub fn colormap(self) -> Option<Colormap> {
        match self {
            EdgeColorSource::Plain => None,
            EdgeColorSource::SignedFlow | EdgeColorSource::AbsoluteFlow => {
                Some(Colormap::RdYlGnReversed)
            }
            EdgeColorSource::Congestion => Some(Colormap::Reds),
        }
    }

    pub fn colorbar_label(self) -> Option<&'static str> {
        match self {
            EdgeColorSource::Plain => None,
            EdgeColorSource::SignedFlow => Some("Power Flow (MW)"),
            EdgeColorSource::AbsoluteFlow => Some("Absolute Power Flow (MW)"),
            EdgeColorSource::Congestion => Some("Congestion"),
        }
    }

    /// 单条线路的边值
    pub fn value(self, line: &LineFlow) -> Option<f64> {
        match self {
            EdgeColorSource::Plain => None,
            EdgeColorSource::SignedFlow => Some(line.flow),
            EdgeColorSource::AbsoluteFlow => Some(line.abs_flow()),
            EdgeColorSource::Congestion => Some(line.congestion()),
        }
    }

    /// 以 (from, to) 为键的边值表
    pub fn edge_values(self, flows: &[LineFlow]) -> EdgeValues {
        let mut values = EdgeValues::new();
        for line in flows {
            if let Some(v) = self.value(line) {
                values.insert(line.line.from_bus.clone(), line.line.to_bus.clone(), v);
            }
        }
        values
    }

    /// 色条范围；拥塞视图固定为 [0, 1]
    pub fn colorbar_range(self, values: &EdgeValues) -> Result<Option<(f64, f64)>> {
        match self {
            EdgeColorSource::Plain => Ok(None),
            EdgeColorSource::Congestion => Ok(Some((0.0, 1.0))),
            EdgeColorSource::SignedFlow | EdgeColorSource::AbsoluteFlow => {
                data_range(values.values()).map(Some)
            }
        }
    }

    /// 构建叠加层
    pub fn overlay(self, graph: &TransmissionGraph, flows: &[LineFlow]) -> Result<EdgeOverlay> {
        let (colormap, label) = match (self.colormap(), self.colorbar_label()) {
            (Some(colormap), Some(label)) => (colormap, label),
            _ => return Ok(plain_overlay(graph)),
        };

        let values = self.edge_values(flows);
        let per_edge = values.for_edges(graph)?;
        let (bar_min, bar_max) = self
            .colorbar_range(&values)?
            .ok_or(GridUtilError::EmptyNetwork)?;
        let (edge_min, edge_max) = data_range(per_edge.iter().copied()).unwrap_or((0.0, 0.0));

        Ok(EdgeOverlay {
            colors: per_edge
                .iter()
                .map(|v| colormap.color_at(normalize(*v, edge_min, edge_max)))
                .collect(),
            labels: per_edge.iter().map(|v| format!("{:.2} MW", v)).collect(),
            colorbar: Some(ColorBar {
                colormap,
                min: bar_min,
                max: bar_max,
                label,
            }),
        })
    }
}

fn plain_overlay(graph: &TransmissionGraph) -> EdgeOverlay {
    EdgeOverlay {
        colors: vec![PLAIN_EDGE; graph.edge_count()],
        labels: graph
            .edges()
            .map(|(_, _, branch)| format!("b={}", branch.susceptance))
            .collect(),
        colorbar: None,
    }
}

/// 最小值与最大值，空序列报错
fn data_range(values: impl Iterator<Item = f64>) -> Result<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for v in values {
        range = Some(match range {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    range.ok_or(GridUtilError::EmptyNetwork)
}
