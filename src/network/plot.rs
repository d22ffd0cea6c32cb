//! # 网络图渲染
//!
//! 使用 `plotters` 将布局后的输电网络绘制为 PNG 或 SVG。
//!
//! ## 画面组成
//! - 标题
//! - 边：按叠加层着色，中点标注
//! - 节点：浅蓝色圆形，内部标注母线编号
//! - 色条（可选）：位于右侧，带轴标签
//!
//! ## 依赖关系
//! - 被 `commands/network.rs` 调用
//! - 使用 `network/graph.rs`, `network/layout.rs`, `network/overlay.rs`

use crate::error::{GridUtilError, Result};
use crate::network::graph::TransmissionGraph;
use crate::network::layout::Layout;
use crate::network::overlay::{ColorBar, EdgeOverlay};

use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// 节点填充色 (skyblue)
const NODE_COLOR: RGBColor = RGBColor(135, 206, 235);
const NODE_RADIUS: i32 = 18;
/// 坐标范围留白
const AXIS_EXTENT: f64 = 1.2;
/// 色条分段数
const COLORBAR_STEPS: usize = 100;
/// 色条区域宽度占比
const COLORBAR_FRACTION: f64 = 0.12;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }

    /// 由扩展名推断，未知扩展名返回 None
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

/// 一次渲染的全部输入
pub struct NetworkPlot<'a> {
    pub graph: &'a TransmissionGraph,
    pub layout: &'a Layout,
    pub overlay: &'a EdgeOverlay,
    pub title: &'a str,
}

/// 生成网络图
pub fn generate_network_plot(
    plot: &NetworkPlot<'_>,
    output_path: &Path,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<()> {
    if plot.overlay.colors.len() != plot.graph.edge_count()
        || plot.overlay.labels.len() != plot.graph.edge_count()
    {
        return Err(GridUtilError::RenderError(format!(
            "overlay has {} colors for {} edges",
            plot.overlay.colors.len(),
            plot.graph.edge_count()
        )));
    }

    match format {
        ImageFormat::Svg => generate_svg(plot, output_path, width, height),
        ImageFormat::Png => generate_png(plot, output_path, width, height),
    }
}

/// 生成 PNG
fn generate_png(plot: &NetworkPlot<'_>, output_path: &Path, width: u32, height: u32) -> Result<()> {
    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    draw_network(&root, plot)?;
    root.present()
        .map_err(|e| GridUtilError::RenderError(e.to_string()))?;
    Ok(())
}

/// 生成 SVG
fn generate_svg(plot: &NetworkPlot<'_>, output_path: &Path, width: u32, height: u32) -> Result<()> {
    let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
    draw_network(&root, plot)?;
    root.present()
        .map_err(|e| GridUtilError::RenderError(e.to_string()))?;
    Ok(())
}

fn render_err<E: std::fmt::Debug>(e: E) -> GridUtilError {
    GridUtilError::RenderError(format!("{:?}", e))
}

/// 绘制网络图的核心逻辑
fn draw_network<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    plot: &NetworkPlot<'_>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;
    let body = root
        .titled(plot.title, ("sans-serif", 28).into_font())
        .map_err(render_err)?;

    let (network_area, bar_area) = match plot.overlay.colorbar {
        Some(_) => {
            let (w, _) = body.dim_in_pixel();
            let bar_width = (w as f64 * COLORBAR_FRACTION).round() as u32;
            let (left, right) = body.split_horizontally(w.saturating_sub(bar_width) as i32);
            (left, Some(right))
        }
        None => (body, None),
    };

    let mut chart = ChartBuilder::on(&network_area)
        .margin(20)
        .build_cartesian_2d(-AXIS_EXTENT..AXIS_EXTENT, -AXIS_EXTENT..AXIS_EXTENT)
        .map_err(render_err)?;

    let positions: Vec<(f64, f64)> = plot
        .graph
        .graph()
        .node_indices()
        .map(|idx| plot.layout.position(idx).unwrap_or((0.0, 0.0)))
        .collect();

    // 边
    let edge_style = ("sans-serif", 12)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (((a, b), color), label) in plot
        .graph
        .edge_endpoints()
        .zip(&plot.overlay.colors)
        .zip(&plot.overlay.labels)
    {
        let (p, q) = (positions[a.index()], positions[b.index()]);
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![p, q],
                color.mix(0.7).stroke_width(2),
            )))
            .map_err(render_err)?;

        let mid = ((p.0 + q.0) / 2.0, (p.1 + q.1) / 2.0);
        chart
            .draw_series(std::iter::once(Text::new(
                label.clone(),
                mid,
                edge_style.clone(),
            )))
            .map_err(render_err)?;
    }

    // 节点
    let node_style = ("sans-serif", 14)
        .into_font()
        .style(FontStyle::Bold)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    chart
        .draw_series(
            positions
                .iter()
                .map(|&p| Circle::new(p, NODE_RADIUS, NODE_COLOR.mix(0.7).filled())),
        )
        .map_err(render_err)?;

    chart
        .draw_series(plot.graph.graph().node_indices().map(|idx| {
            Text::new(
                plot.graph.graph()[idx].to_string(),
                positions[idx.index()],
                node_style.clone(),
            )
        }))
        .map_err(render_err)?;

    if let (Some(area), Some(bar)) = (bar_area, plot.overlay.colorbar) {
        draw_colorbar(&area, &bar)?;
    }

    Ok(())
}

/// 色条：纵向堆叠的色块
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    bar: &ColorBar,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (lo, hi) = colorbar_axis(bar.min, bar.max);

    let mut chart = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(40)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc(bar.label)
        .y_label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(render_err)?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|i| {
            let y0 = lo + step * i as f64;
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            Rectangle::new([(0.0, y0), (1.0, y0 + step)], bar.colormap.color_at(t).filled())
        }))
        .map_err(render_err)?;

    Ok(())
}

/// 退化区间向两侧扩展 0.5
fn colorbar_axis(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        (min - 0.5, min + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::model::sample_network;

    #[test]
    fn test_image_format_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("net.SVG")),
            Some(ImageFormat::Svg)
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("out/net.png")),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_path(Path::new("net.pdf")), None);
        assert_eq!(ImageFormat::from_path(Path::new("net")), None);
    }

    #[test]
    fn test_colorbar_axis() {
        assert_eq!(colorbar_axis(0.0, 1.0), (0.0, 1.0));
        assert_eq!(colorbar_axis(3.0, 3.0), (2.5, 3.5));
    }

    #[test]
    fn test_mismatched_overlay_rejected() {
        let table = sample_network();
        let graph = TransmissionGraph::from_lines(table.lines());
        let layout = Layout::default();
        let overlay = EdgeOverlay {
            colors: Vec::new(),
            labels: Vec::new(),
            colorbar: None,
        };
        let plot = NetworkPlot {
            graph: &graph,
            layout: &layout,
            overlay: &overlay,
            title: "t",
        };
        let result = generate_network_plot(&plot, Path::new("unused.svg"), 10, 10, ImageFormat::Svg);
        assert!(matches!(result, Err(GridUtilError::RenderError(_))));
    }
}
