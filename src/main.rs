//! # gridutil - 电力系统建模辅助工具
//!
//! 两个独立的小工具合并为单一可执行文件。
//!
//! ## 子命令
//! - `iis`     - LP 模型求解与不可行性诊断（IIS）
//! - `network` - 输电网络绘图（潮流、越限着色）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── lp/       (LP 读写、求解、IIS)
//!   │     ├── network/  (网络图、布局、渲染)
//!   │     └── batch/    (批量诊断)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod lp;
mod network;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
