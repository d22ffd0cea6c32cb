//! # iis 子命令 CLI 定义
//!
//! 读取 LP 模型，求解并在不可行时写出 IIS
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/iis.rs`

use clap::Args;
use std::path::PathBuf;

/// iis 子命令参数
#[derive(Args, Debug)]
pub struct IisArgs {
    /// Model file (LP format) relative to --dir, or a directory of models (batch mode)
    #[arg(default_value = "model.lp")]
    pub model: PathBuf,

    /// Directory holding the model and receiving the IIS file (default: current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// File name of the written IIS (single-model mode)
    #[arg(long, default_value = "ISS.ilp")]
    pub iis_file: String,

    /// Branch-and-bound node limit for models with integer variables
    #[arg(long, default_value_t = 10_000)]
    pub node_limit: usize,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for model files (batch mode, comma separated)
    #[arg(long, default_value = "*.lp")]
    pub pattern: String,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
