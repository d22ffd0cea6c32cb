//! # 统一错误处理模块
//!
//! 定义 gridutil 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// gridutil 统一错误类型
#[derive(Error, Debug)]
pub enum GridUtilError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("LP syntax error on line {line}: {reason}")]
    LpSyntax { line: usize, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 求解器错误
    // ─────────────────────────────────────────────────────────────
    #[error("Cannot compute IIS on a feasible model")]
    ModelFeasible,

    #[error("Solver failed: {0}")]
    SolverFailed(String),

    // ─────────────────────────────────────────────────────────────
    // 网络数据错误
    // ─────────────────────────────────────────────────────────────
    #[error("Line table has {lines} rows but flow table has {flows} rows")]
    FlowCountMismatch { lines: usize, flows: usize },

    #[error("Line {row} has no flow value")]
    MissingFlow { row: usize },

    #[error("No edge value for line {from} - {to} in either orientation")]
    MissingEdgeValue { from: String, to: String },

    #[error("Network has no lines to color")]
    EmptyNetwork,

    #[error("Rendering failed: {0}")]
    RenderError(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GridUtilError>;
