//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `iis`: LP 模型不可行性诊断
//! - `network`: 输电网络绘图
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: iis, network

pub mod iis;
pub mod network;

use clap::{Parser, Subcommand};

/// gridutil - 电力系统建模辅助工具
#[derive(Parser)]
#[command(name = "gridutil")]
#[command(version)]
#[command(about = "Power-system modelling helpers: LP infeasibility triage and network plots", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Solve an LP model and write its irreducible infeasible subsystem if infeasible
    Iis(iis::IisArgs),

    /// Draw a transmission network, optionally colored by power flow or congestion
    Network(network::NetworkArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::network::NetworkView;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["gridutil", "iis"]).unwrap();
        match cli.command {
            Commands::Iis(args) => {
                assert_eq!(args.model.to_str(), Some("model.lp"));
                assert_eq!(args.iis_file, "ISS.ilp");
                assert_eq!(args.node_limit, 10_000);
                assert!(args.dir.is_none());
            }
            _ => panic!("expected iis"),
        }

        let cli = Cli::try_parse_from(["gridutil", "network", "--view", "abs-flow"]).unwrap();
        match cli.command {
            Commands::Network(args) => {
                assert_eq!(args.view, NetworkView::AbsFlow);
                assert_eq!(args.iterations, 500);
                assert!(args.lines.is_none());
            }
            _ => panic!("expected network"),
        }
    }
}
