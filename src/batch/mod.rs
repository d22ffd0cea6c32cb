//! # 批量处理模块
//!
//! 目录模式下批量诊断 LP 模型。
//!
//! ## 功能
//! - 按 glob 模式收集模型文件
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/iis.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ModelOutcome, ProcessResult};
