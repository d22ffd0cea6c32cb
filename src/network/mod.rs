//! # 输电网络可视化
//!
//! 线路表 → 无向图 → 力导向布局 → 按视图着色 → PNG/SVG。
//!
//! ## 子模块
//! - `model`: 母线、线路、潮流与 CSV 读取
//! - `graph`: `petgraph` 网络图与边值查询
//! - `layout`: `fdg-sim` 力导向布局
//! - `colormap`: 颜色映射
//! - `overlay`: 四种视图的边着色
//! - `plot`: `plotters` 渲染
//! - `export`: 线路指标 CSV

pub mod colormap;
pub mod export;
pub mod graph;
pub mod layout;
pub mod model;
pub mod overlay;
pub mod plot;

pub use graph::TransmissionGraph;
pub use layout::{spring_layout, DEFAULT_ITERATIONS};
pub use model::{load_flows, load_lines, sample_network, LineFlow, LineTable};
pub use overlay::EdgeColorSource;
pub use plot::{generate_network_plot, ImageFormat, NetworkPlot};
