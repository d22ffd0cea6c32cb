//! # 线性规划模块
//!
//! LP 文件读写、求解与不可行性诊断。
//!
//! ## 子模块
//! - `model`: 模型数据结构
//! - `parser`: LP 格式解析
//! - `writer`: LP / ILP 格式输出
//! - `solver`: LP 松弛与分支定界
//! - `iis`: 不可约不可行子系统
//! - `triage`: 诊断流程
//!
//! ## 依赖关系
//! - 被 `commands/iis.rs` 使用

pub mod iis;
pub mod model;
pub mod parser;
pub mod solver;
pub mod triage;
pub mod writer;

pub use solver::Status;
pub use triage::{write_iis, TriageConfig, TriageMessage, TriageReport};
