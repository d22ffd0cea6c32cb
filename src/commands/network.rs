//! # network 命令实现
//!
//! 读取线路表，构建网络图，计算布局，按所选视图渲染。
//!
//! ## 功能
//! - CSV 线路表或内置示例网络
//! - 可选的独立潮流表（按行合并）
//! - 单视图写入 `--output`，`all` 按视图加后缀
//! - 线路指标表格与 CSV 导出
//!
//! ## 依赖关系
//! - 使用 `cli/network.rs` 定义的参数
//! - 使用 `network/` 模块
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::network::{NetworkArgs, NetworkView};
use crate::error::{GridUtilError, Result};
use crate::network::export::metrics_to_csv;
use crate::network::{
    generate_network_plot, load_flows, load_lines, sample_network, spring_layout,
    EdgeColorSource, ImageFormat, LineFlow, LineTable, NetworkPlot, TransmissionGraph,
};
use crate::utils::{output, progress};

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 线路指标表格行
#[derive(Debug, Clone, Tabled)]
struct LineRow {
    #[tabled(rename = "From")]
    from_bus: String,
    #[tabled(rename = "To")]
    to_bus: String,
    #[tabled(rename = "Capacity (MW)")]
    capacity: String,
    #[tabled(rename = "Flow (MW)")]
    flow: String,
    #[tabled(rename = "|Flow| (MW)")]
    abs_flow: String,
    #[tabled(rename = "Congestion (MW)")]
    congestion: String,
}

impl From<&LineFlow> for LineRow {
    fn from(line: &LineFlow) -> Self {
        Self {
            from_bus: line.line.from_bus.to_string(),
            to_bus: line.line.to_bus.to_string(),
            capacity: format!("{:.2}", line.line.capacity),
            flow: format!("{:.2}", line.flow),
            abs_flow: format!("{:.2}", line.abs_flow()),
            congestion: format!("{:.2}", line.congestion()),
        }
    }
}

/// 执行 network 命令
pub fn execute(args: NetworkArgs) -> Result<()> {
    output::print_header("Transmission Network Plot");

    let table = load_table(&args)?;
    if table.is_empty() {
        return Err(GridUtilError::EmptyNetwork);
    }

    let graph = TransmissionGraph::from_lines(table.lines());
    output::print_info(&format!(
        "Network: {} buses, {} lines",
        graph.node_count(),
        graph.edge_count()
    ));

    let sources = args.view.sources();
    // 单独请求的潮流视图必须有潮流；`all` 缺潮流时只画 plain
    let flows = match table.line_flows() {
        Ok(flows) => flows,
        Err(e) if args.view != NetworkView::All && sources.iter().any(|s| s.needs_flows()) => {
            return Err(e)
        }
        Err(_) => {
            if args.view == NetworkView::All {
                output::print_warning("No flows available; only the plain view will be drawn");
            }
            Vec::new()
        }
    };
    let sources: Vec<EdgeColorSource> = sources
        .into_iter()
        .filter(|s| !s.needs_flows() || !flows.is_empty())
        .collect();

    if !flows.is_empty() {
        print_line_table(&flows);
        if let Some(path) = &args.export_csv {
            metrics_to_csv(&flows, path)?;
            output::print_success(&format!("Line metrics saved to '{}'", path.display()));
        }
    } else if args.export_csv.is_some() {
        output::print_warning("No flows available; skipping CSV export");
    }

    let format = resolve_format(&args)?;

    let spinner = progress::create_spinner("Computing layout...");
    let layout = spring_layout(&graph, args.iterations);
    spinner.finish_and_clear();

    let multiple = args.view == NetworkView::All;
    for source in sources {
        let overlay = source.overlay(&graph, &flows)?;
        let (default_w, default_h) = source.default_size();
        let output_path = output_path_for(&args.output, source, format, multiple);

        let plot = NetworkPlot {
            graph: &graph,
            layout: &layout,
            overlay: &overlay,
            title: source.title(),
        };
        generate_network_plot(
            &plot,
            &output_path,
            args.width.unwrap_or(default_w),
            args.height.unwrap_or(default_h),
            format,
        )?;
        output::print_success(&format!(
            "{} view saved to '{}'",
            source.slug(),
            output_path.display()
        ));
    }

    Ok(())
}

/// 读取线路表，并合并独立的潮流表
fn load_table(args: &NetworkArgs) -> Result<LineTable> {
    let mut table = match &args.lines {
        Some(path) => {
            output::print_info(&format!("Reading lines from '{}'", path.display()));
            load_lines(path)?
        }
        None => {
            output::print_info("Using built-in 8-line sample network");
            sample_network()
        }
    };

    if let Some(path) = &args.flows {
        output::print_info(&format!("Reading flows from '{}'", path.display()));
        table.join_flows(load_flows(path)?)?;
    }

    output::print_info(&format!("Loaded {} lines", table.len()));
    Ok(table)
}

/// 输出格式：显式参数优先，其次按扩展名推断，默认 PNG
fn resolve_format(args: &NetworkArgs) -> Result<ImageFormat> {
    if let Some(format) = args.format {
        return Ok(format.into());
    }
    match args.output.extension() {
        None => Ok(ImageFormat::Png),
        Some(_) => ImageFormat::from_path(&args.output).ok_or_else(|| {
            GridUtilError::InvalidArgument(format!(
                "Cannot infer image format from '{}'; use --format png|svg",
                args.output.display()
            ))
        }),
    }
}

/// 输出路径；多视图时为 `<stem>_<view>.<ext>`
fn output_path_for(
    output: &Path,
    source: EdgeColorSource,
    format: ImageFormat,
    multiple: bool,
) -> PathBuf {
    if !multiple {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("network");
    output.with_file_name(format!("{}_{}.{}", stem, source.slug(), format.extension()))
}

fn print_line_table(flows: &[LineFlow]) {
    output::print_header("Line Flows");
    let rows: Vec<LineRow> = flows.iter().map(LineRow::from).collect();
    println!("{}", Table::new(&rows));

    let congested = flows.iter().filter(|l| l.congestion() > 0.0).count();
    if congested > 0 {
        output::print_warning(&format!("{} of {} lines exceed capacity", congested, flows.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::network::NetworkImageFormat;
    use std::fs;
    use tempfile::TempDir;

    fn args(output: &str) -> NetworkArgs {
        NetworkArgs {
            lines: None,
            flows: None,
            view: NetworkView::All,
            output: PathBuf::from(output),
            format: None,
            width: None,
            height: None,
            iterations: 10,
            export_csv: None,
        }
    }

    #[test]
    fn test_output_path_for_all_views() {
        let path = output_path_for(
            Path::new("out/net.png"),
            EdgeColorSource::AbsoluteFlow,
            ImageFormat::Png,
            true,
        );
        assert_eq!(path, PathBuf::from("out/net_abs-flow.png"));

        let single = output_path_for(
            Path::new("out/net.svg"),
            EdgeColorSource::Congestion,
            ImageFormat::Svg,
            false,
        );
        assert_eq!(single, PathBuf::from("out/net.svg"));
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format(&args("net.svg")).unwrap(), ImageFormat::Svg);
        assert_eq!(resolve_format(&args("net")).unwrap(), ImageFormat::Png);
        assert!(matches!(
            resolve_format(&args("net.pdf")),
            Err(GridUtilError::InvalidArgument(_))
        ));

        let mut explicit = args("net.pdf");
        explicit.format = Some(NetworkImageFormat::Svg);
        assert_eq!(resolve_format(&explicit).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn test_load_table_joins_flows() {
        let dir = TempDir::new().unwrap();
        let lines = dir.path().join("lines.csv");
        let flows = dir.path().join("flows.csv");
        fs::write(&lines, "from_bus,to_bus,capacity,susceptance\n1,2,50,10\n2,3,50,10\n").unwrap();
        fs::write(&flows, "flow\n60\n-10\n").unwrap();

        let mut a = args("net.png");
        a.lines = Some(lines.clone());
        a.flows = Some(flows);
        let table = load_table(&a).unwrap();
        let joined = table.line_flows().unwrap();
        assert_eq!(joined[0].congestion(), 10.0);

        let short = dir.path().join("short.csv");
        fs::write(&short, "flow\n1\n").unwrap();
        a.flows = Some(short);
        assert!(matches!(
            load_table(&a),
            Err(GridUtilError::FlowCountMismatch { lines: 2, flows: 1 })
        ));
    }

    #[test]
    fn test_sample_table_rows() {
        let flows = sample_network().line_flows().unwrap();
        let row = LineRow::from(&flows[4]);
        assert_eq!(row.flow, "-120.00");
        assert_eq!(row.abs_flow, "120.00");
        assert_eq!(row.congestion, "20.00");
    }
}
