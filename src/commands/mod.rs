//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `lp/`, `network/`, `batch/`, `utils/`
//! - 子模块: iis, network

pub mod iis;
pub mod network;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Iis(args) => iis::execute(args),
        Commands::Network(args) => network::execute(args),
    }
}
