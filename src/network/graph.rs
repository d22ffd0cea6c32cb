//! # 网络图
//!
//! 使用 `petgraph` 构建无向简单图：节点为母线，边为线路。
//!
//! ## 约定
//! - 节点按首次出现顺序加入
//! - 同一对母线（任意方向）重复出现时覆盖边属性
//! - 边值按 (from, to) 记录，查询时先查 (a, b)，再查 (b, a)
//!
//! ## 依赖关系
//! - 被 `network/layout.rs`, `network/plot.rs`, `commands/network.rs` 使用
//! - 使用 `network/model.rs`

use crate::error::{GridUtilError, Result};
use crate::network::model::{BusId, Line};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// 边属性
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub susceptance: f64,
}

/// 输电网络图
#[derive(Debug, Clone, Default)]
pub struct TransmissionGraph {
    graph: UnGraph<BusId, Branch>,
    index: HashMap<BusId, NodeIndex>,
}

impl TransmissionGraph {
    /// 从线路表构建
    pub fn from_lines(lines: &[Line]) -> Self {
        let mut g = Self::default();

        for line in lines {
            g.add_bus(&line.from_bus);
            g.add_bus(&line.to_bus);
        }

        for line in lines {
            let a = g.index[&line.from_bus];
            let b = g.index[&line.to_bus];
            g.graph.update_edge(
                a,
                b,
                Branch {
                    susceptance: line.susceptance,
                },
            );
        }

        g
    }

    fn add_bus(&mut self, bus: &BusId) -> NodeIndex {
        if let Some(&idx) = self.index.get(bus) {
            return idx;
        }
        let idx = self.graph.add_node(bus.clone());
        self.index.insert(bus.clone(), idx);
        idx
    }

    pub fn graph(&self) -> &UnGraph<BusId, Branch> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// 按插入顺序遍历边：(端点 a, 端点 b, 属性)
    pub fn edges(&self) -> impl Iterator<Item = (&BusId, &BusId, &Branch)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    /// 边的节点下标
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }
}

/// 按母线对记录的边值
#[derive(Debug, Clone, Default)]
pub struct EdgeValues {
    values: HashMap<(BusId, BusId), f64>,
}

impl EdgeValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: BusId, to: BusId, value: f64) {
        self.values.insert((from, to), value);
    }

    /// 先查 (a, b)，再查 (b, a)
    pub fn get(&self, a: &BusId, b: &BusId) -> Option<f64> {
        self.values
            .get(&(a.clone(), b.clone()))
            .or_else(|| self.values.get(&(b.clone(), a.clone())))
            .copied()
    }

    /// 按图中边的顺序取值，任一边缺值即报错
    pub fn for_edges(&self, graph: &TransmissionGraph) -> Result<Vec<f64>> {
        graph
            .edges()
            .map(|(a, b, _)| {
                self.get(a, b).ok_or_else(|| GridUtilError::MissingEdgeValue {
                    from: a.to_string(),
                    to: b.to_string(),
                })
            })
            .collect()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }
}
