//! # network 子命令 CLI 定义
//!
//! 绘制输电网络图，可按潮流或越限量为线路着色
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/network.rs`

use crate::network::{EdgeColorSource, ImageFormat, DEFAULT_ITERATIONS};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 视图
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum NetworkView {
    /// Gray edges labelled with susceptance
    Plain,
    /// Edges colored by signed power flow
    Flow,
    /// Edges colored by absolute power flow
    AbsFlow,
    /// Edges colored by flow in excess of capacity
    Congestion,
    /// Render every view
    #[default]
    All,
}

impl NetworkView {
    /// 展开为需要渲染的着色来源
    pub fn sources(self) -> Vec<EdgeColorSource> {
        match self {
            NetworkView::Plain => vec![EdgeColorSource::Plain],
            NetworkView::Flow => vec![EdgeColorSource::SignedFlow],
            NetworkView::AbsFlow => vec![EdgeColorSource::AbsoluteFlow],
            NetworkView::Congestion => vec![EdgeColorSource::Congestion],
            NetworkView::All => EdgeColorSource::ALL.to_vec(),
        }
    }
}

/// 图像输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum NetworkImageFormat {
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
}

impl From<NetworkImageFormat> for ImageFormat {
    fn from(format: NetworkImageFormat) -> Self {
        match format {
            NetworkImageFormat::Png => ImageFormat::Png,
            NetworkImageFormat::Svg => ImageFormat::Svg,
        }
    }
}

/// network 子命令参数
#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// CSV line table: from_bus,to_bus,capacity,susceptance[,flow] (default: built-in sample)
    #[arg(short, long)]
    pub lines: Option<PathBuf>,

    /// CSV with a single 'flow' column, joined to the line table by row
    #[arg(long)]
    pub flows: Option<PathBuf>,

    /// View to render
    #[arg(long, value_enum, default_value = "all")]
    pub view: NetworkView,

    /// Output image; with --view all, '<stem>_<view>.<ext>' is written per view
    #[arg(short, long, default_value = "network.png")]
    pub output: PathBuf,

    /// Image format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<NetworkImageFormat>,

    /// Figure width in pixels (default depends on the view)
    #[arg(long)]
    pub width: Option<u32>,

    /// Figure height in pixels (default depends on the view)
    #[arg(long)]
    pub height: Option<u32>,

    /// Force-directed layout steps
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Write per-line flow metrics to this CSV file
    #[arg(long)]
    pub export_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_sources() {
        assert_eq!(NetworkView::All.sources().len(), 4);
        assert_eq!(
            NetworkView::AbsFlow.sources(),
            vec![EdgeColorSource::AbsoluteFlow]
        );
    }
}
