//! # 力导向布局
//!
//! 使用 `fdg-sim` 的 Fruchterman-Reingold 力模型计算节点坐标。
//! 初始位置随机，每次运行结果可能不同。输出坐标缩放到 [-1, 1]。
//!
//! ## 依赖关系
//! - 被 `commands/network.rs` 调用
//! - 使用 `network/graph.rs`

use crate::network::graph::TransmissionGraph;

use fdg_sim::{
    force::fruchterman_reingold, ForceGraph, ForceGraphHelper, Simulation, SimulationParameters,
};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// 默认迭代步数
pub const DEFAULT_ITERATIONS: usize = 500;

/// 节点坐标
#[derive(Debug, Clone, Default)]
pub struct Layout {
    positions: HashMap<NodeIndex, (f64, f64)>,
}

impl Layout {
    pub fn position(&self, node: NodeIndex) -> Option<(f64, f64)> {
        self.positions.get(&node).copied()
    }

    /// 平移到原点并按最大绝对坐标缩放
    fn rescale(mut self) -> Self {
        if self.positions.is_empty() {
            return self;
        }

        let n = self.positions.len() as f64;
        let (sx, sy) = self
            .positions
            .values()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let (cx, cy) = (sx / n, sy / n);

        let extent = self
            .positions
            .values()
            .map(|(x, y)| (x - cx).abs().max((y - cy).abs()))
            .fold(0.0_f64, f64::max);

        for (x, y) in self.positions.values_mut() {
            *x -= cx;
            *y -= cy;
            if extent > 0.0 {
                *x /= extent;
                *y /= extent;
            }
        }
        self
    }
}

/// 力导向布局
pub fn spring_layout(network: &TransmissionGraph, iterations: usize) -> Layout {
    let source = network.graph();
    if source.node_count() == 0 {
        return Layout::default();
    }

    let mut graph: ForceGraph<usize, ()> = ForceGraph::default();
    let mut index_map: HashMap<usize, _> = HashMap::new();
    for node in source.node_indices() {
        let idx = graph.add_force_node(source[node].to_string(), node.index());
        index_map.insert(node.index(), idx);
    }

    for (a, b) in network.edge_endpoints() {
        if let (Some(&from), Some(&to)) = (index_map.get(&a.index()), index_map.get(&b.index())) {
            graph.add_edge(from, to, ());
        }
    }

    let mut params = SimulationParameters::default();
    params.set_force(fruchterman_reingold(45.0, 0.95));
    let mut simulation = Simulation::from_graph(graph, params);
    for _ in 0..iterations {
        simulation.update(0.02);
    }

    let graph = simulation.get_graph();
    let positions = graph
        .node_indices()
        .map(|idx| {
            let node = &graph[idx];
            (
                NodeIndex::new(node.data),
                (node.location.x as f64, node.location.y as f64),
            )
        })
        .collect();

    Layout { positions }.rescale()
}
