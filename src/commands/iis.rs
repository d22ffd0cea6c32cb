//! # iis 命令实现
//!
//! 对 LP 模型做不可行性诊断。
//!
//! ## 功能
//! - 单模型：打印状态，不可行时写出 IIS 并打印内容
//! - 目录：批量并行诊断，每个模型的 IIS 写为同目录下的 `<stem>.ilp`
//!
//! ## 依赖关系
//! - 使用 `cli/iis.rs` 定义的参数
//! - 使用 `lp/triage.rs`
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{BatchRunner, FileCollector, ModelOutcome, ProcessResult};
use crate::cli::iis::IisArgs;
use crate::error::{GridUtilError, Result};
use crate::lp::iis::IisEntry;
use crate::lp::{write_iis, TriageConfig, TriageMessage, TriageReport};
use crate::utils::{output, progress};

use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// IIS 摘要表格行
#[derive(Debug, Clone, Tabled)]
struct IisRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Definition")]
    detail: String,
}

impl From<&IisEntry> for IisRow {
    fn from(entry: &IisEntry) -> Self {
        Self {
            kind: entry.kind,
            name: entry.name.clone(),
            detail: entry.detail.clone(),
        }
    }
}

/// 执行 iis 命令
pub fn execute(args: IisArgs) -> Result<()> {
    output::print_header("LP Infeasibility Triage");

    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| GridUtilError::FileReadError {
            path: ".".to_string(),
            source: e,
        })?,
    };
    let target = dir.join(&args.model);

    if target.is_dir() {
        execute_batch(&target, &args)
    } else {
        let config = single_config(&target, &args)?;
        execute_single(&config)
    }
}

/// 单模型配置：IIS 写入模型所在目录
fn single_config(target: &Path, args: &IisArgs) -> Result<TriageConfig> {
    let (dir, name) = match (target.parent(), target.file_name()) {
        (Some(dir), Some(name)) => (dir, name),
        _ => {
            return Err(GridUtilError::InvalidArgument(format!(
                "'{}' is not a model file path",
                target.display()
            )))
        }
    };

    Ok(TriageConfig::new(dir)
        .with_model_file(name.to_string_lossy())
        .with_iis_file(args.iis_file.clone())
        .with_node_limit(args.node_limit))
}

/// 单模型模式
fn execute_single(config: &TriageConfig) -> Result<()> {
    output::print_info(&format!("Reading model '{}'", config.model_path().display()));

    let pb = progress::create_progress_bar(0, "Deletion filter");
    let report = write_iis(config, &pb)?;
    pb.finish_and_clear();

    print_report(&report);
    Ok(())
}

/// 按顺序打印诊断消息
fn print_report(report: &TriageReport) {
    for message in &report.messages {
        match message {
            TriageMessage::Status(status) => {
                output::print_status(
                    &status.to_string(),
                    status.code(),
                    status.indicates_infeasibility(),
                );
                if let Some(obj) = report.objective {
                    output::print_info(&format!("Objective: {:.6}", obj));
                }
            }
            TriageMessage::Unbounded => output::print_warning("Model is unbounded!"),
            TriageMessage::ComputingIis => {
                output::print_warning("Model is infeasible. Computing IIS...")
            }
            TriageMessage::IisWritten(path) => {
                output::print_success(&format!("IIS written to '{}'", path.display()))
            }
            TriageMessage::IisNotMinimal => output::print_warning(
                "Node limit reached during filtering; IIS is not proven minimal",
            ),
            TriageMessage::Iis(text) => output::print_block("IIS", text),
            TriageMessage::NotInfeasible => {
                output::print_info("Model is not infeasible. No need to compute IIS")
            }
        }
    }

    if !report.iis_entries.is_empty() {
        output::print_header(&format!(
            "IIS Summary: {} ({} members)",
            report.model_name,
            report.iis_entries.len()
        ));
        let rows: Vec<IisRow> = report.iis_entries.iter().map(IisRow::from).collect();
        println!("{}", Table::new(&rows));
    }
}

/// 批量处理模式
fn execute_batch(input: &Path, args: &IisArgs) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", input.display()));

    let collector = FileCollector::new(input.to_path_buf())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);

    let files = collector.collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} model files", files.len()));

    let node_limit = args.node_limit;
    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| process_batch_file(file, node_limit))?;

    output::print_separator();
    output::print_done(&format!(
        "Batch complete: {} models, {} IIS written, {} failed",
        result.total(),
        result.iis_written(),
        result.failures.len()
    ));
    for (status, count) in result.status_counts() {
        output::print_info(&format!("  {:<12} ({}): {}", status.to_string(), status.code(), count));
    }

    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path.display(), err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 批量模式下单个模型的诊断配置
fn batch_config(file: &Path, node_limit: usize) -> Option<TriageConfig> {
    let dir = file.parent()?;
    let name = file.file_name()?.to_str()?;
    let stem = file.file_stem()?.to_str()?;

    Some(
        TriageConfig::new(dir)
            .with_model_file(name)
            .with_iis_file(format!("{}.ilp", stem))
            .with_node_limit(node_limit),
    )
}

/// 处理批量模式中的单个文件
fn process_batch_file(file: &PathBuf, node_limit: usize) -> ProcessResult {
    let config = match batch_config(file, node_limit) {
        Some(config) => config,
        None => return ProcessResult::Failed(file.clone(), "invalid file name".to_string()),
    };

    match write_iis(&config, &ProgressBar::hidden()) {
        Ok(report) => ProcessResult::Triaged(ModelOutcome {
            model: file.clone(),
            status: report.status,
            iis_path: report.iis_path,
        }),
        Err(e) => ProcessResult::Failed(file.clone(), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::Status;
    use std::fs;
    use tempfile::TempDir;

    const INFEASIBLE: &str =
        "Minimize\n obj: x\nSubject To\n low: x >= 5\n high: x <= 2\nEnd\n";
    const FEASIBLE: &str = "Minimize\n obj: x\nSubject To\n low: x >= 1\nEnd\n";

    #[test]
    fn test_batch_config_names_iis_after_model() {
        let config = batch_config(Path::new("/models/case_a.lp"), 50).unwrap();
        assert_eq!(config.model_path(), PathBuf::from("/models/case_a.lp"));
        assert_eq!(config.iis_path(), PathBuf::from("/models/case_a.ilp"));
        assert_eq!(config.solver.node_limit, 50);
    }

    #[test]
    fn test_process_batch_file() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.lp");
        let good = dir.path().join("good.lp");
        let broken = dir.path().join("broken.lp");
        fs::write(&bad, INFEASIBLE).unwrap();
        fs::write(&good, FEASIBLE).unwrap();
        fs::write(&broken, "Minimize\n obj: x ^ 2\nEnd\n").unwrap();

        match process_batch_file(&bad, 100) {
            ProcessResult::Triaged(outcome) => {
                assert_eq!(outcome.status, Status::Infeasible);
                assert_eq!(outcome.iis_path, Some(dir.path().join("bad.ilp")));
            }
            other => panic!("expected triaged model, got {:?}", other),
        }
        assert!(dir.path().join("bad.ilp").exists());

        match process_batch_file(&good, 100) {
            ProcessResult::Triaged(outcome) => {
                assert_eq!(outcome.status, Status::Optimal);
                assert!(outcome.iis_path.is_none());
            }
            other => panic!("expected triaged model, got {:?}", other),
        }
        assert!(!dir.path().join("good.ilp").exists());

        assert!(matches!(
            process_batch_file(&broken, 100),
            ProcessResult::Failed(_, _)
        ));
    }

    #[test]
    fn test_execute_single_with_explicit_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model.lp"), INFEASIBLE).unwrap();

        execute(args_for(
            PathBuf::from("model.lp"),
            Some(dir.path().to_path_buf()),
        ))
        .unwrap();
        assert!(dir.path().join("ISS.ilp").exists());
    }

    fn args_for(model: PathBuf, dir: Option<PathBuf>) -> IisArgs {
        IisArgs {
            model,
            dir,
            iis_file: "ISS.ilp".to_string(),
            node_limit: 100,
            pattern: "*.lp".to_string(),
            recursive: false,
            jobs: 1,
        }
    }

    #[test]
    fn test_iis_written_next_to_nested_model() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("model.lp"), INFEASIBLE).unwrap();

        execute(args_for(
            PathBuf::from("sub/model.lp"),
            Some(dir.path().to_path_buf()),
        ))
        .unwrap();
        assert!(dir.path().join("sub").join("ISS.ilp").exists());
        assert!(!dir.path().join("ISS.ilp").exists());
    }

    #[test]
    fn test_single_config_with_absolute_model() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("case.lp");
        let args = args_for(model.clone(), None);

        // 绝对路径 join 后保持不变
        let target = PathBuf::from("/elsewhere").join(&args.model);
        let config = single_config(&target, &args).unwrap();
        assert_eq!(config.model_path(), model);
        assert_eq!(config.iis_path(), dir.path().join("ISS.ilp"));
    }

    #[test]
    fn test_execute_batch_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.lp"), INFEASIBLE).unwrap();
        fs::write(dir.path().join("b.lp"), FEASIBLE).unwrap();

        execute(args_for(dir.path().to_path_buf(), None)).unwrap();
        assert!(dir.path().join("a.ilp").exists());
        assert!(!dir.path().join("b.ilp").exists());
    }
}
