//! # 不可行性诊断
//!
//! 读取模型 → 求解 → 检查状态 → 不可行时计算 IIS，写出并读回。
//!
//! ## 状态分支
//! - `UNBOUNDED`: 报告无界，不计算 IIS
//! - `INFEASIBLE` / `INF_OR_UNBD`: 计算 IIS，写入 `ISS.ilp` 并读回
//! - 其他: 报告无需计算 IIS
//!
//! 无界检查之后不提前返回，`UNBOUNDED` 会同时得到"无界"和"无需计算"两条消息。
//! 过滤中节点数耗尽时 IIS 仍会写出，但附带"未证明极小"的警告。
//!
//! ## 依赖关系
//! - 被 `commands/iis.rs` 调用
//! - 使用 `lp/parser.rs`, `lp/solver.rs`, `lp/iis.rs`

use crate::error::{GridUtilError, Result};
use crate::lp::iis::{compute_iis, IisEntry};
use crate::lp::parser::parse_lp_file;
use crate::lp::solver::{Solver, SolverOptions, Status};

use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认 IIS 输出文件名
pub const IIS_FILE_NAME: &str = "ISS.ilp";

/// 默认模型文件名
pub const MODEL_FILE_NAME: &str = "model.lp";

/// 诊断配置
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// 模型所在目录，IIS 文件写入同一目录
    pub dir: PathBuf,
    /// 模型文件名
    pub model_file: String,
    /// IIS 文件名
    pub iis_file: String,
    /// 求解器配置
    pub solver: SolverOptions,
}

impl TriageConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_file: MODEL_FILE_NAME.to_string(),
            iis_file: IIS_FILE_NAME.to_string(),
            solver: SolverOptions::default(),
        }
    }

    pub fn with_model_file(mut self, name: impl Into<String>) -> Self {
        self.model_file = name.into();
        self
    }

    pub fn with_iis_file(mut self, name: impl Into<String>) -> Self {
        self.iis_file = name.into();
        self
    }

    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.solver.node_limit = node_limit;
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn iis_path(&self) -> PathBuf {
        self.dir.join(&self.iis_file)
    }
}

/// 诊断过程中产生的消息，按顺序输出
#[derive(Debug, Clone, PartialEq)]
pub enum TriageMessage {
    Status(Status),
    Unbounded,
    ComputingIis,
    IisWritten(PathBuf),
    IisNotMinimal,
    Iis(String),
    NotInfeasible,
}

/// 诊断结果
#[derive(Debug, Clone)]
pub struct TriageReport {
    pub model_name: String,
    pub status: Status,
    pub objective: Option<f64>,
    pub messages: Vec<TriageMessage>,
    /// 已写出的 IIS 文件
    pub iis_path: Option<PathBuf>,
    /// IIS 摘要
    pub iis_entries: Vec<IisEntry>,
}

impl TriageReport {
    /// 从文件读回的 IIS 文本
    pub fn iis_text(&self) -> Option<&str> {
        self.messages.iter().find_map(|m| match m {
            TriageMessage::Iis(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// 执行诊断
pub fn write_iis(config: &TriageConfig, pb: &ProgressBar) -> Result<TriageReport> {
    let model = parse_lp_file(&config.model_path())?;
    let solver = Solver::new(config.solver);
    let result = solver.optimize(&model)?;

    let mut report = TriageReport {
        model_name: model.name.clone(),
        status: result.status,
        objective: result.objective,
        messages: vec![TriageMessage::Status(result.status)],
        iis_path: None,
        iis_entries: Vec::new(),
    };

    if result.status == Status::Unbounded {
        report.messages.push(TriageMessage::Unbounded);
    }

    if result.status.indicates_infeasibility() {
        report.messages.push(TriageMessage::ComputingIis);

        let iis = compute_iis(&model, &solver, pb)?;
        let iis_path = config.iis_path();
        fs::write(&iis_path, iis.to_ilp_string(&model)).map_err(|e| {
            GridUtilError::FileWriteError {
                path: iis_path.display().to_string(),
                source: e,
            }
        })?;
        report.messages.push(TriageMessage::IisWritten(iis_path.clone()));
        if !iis.minimal {
            report.messages.push(TriageMessage::IisNotMinimal);
        }

        let text = read_back(&iis_path)?;
        report.messages.push(TriageMessage::Iis(text));
        report.iis_entries = iis.entries(&model);
        report.iis_path = Some(iis_path);
    } else {
        report.messages.push(TriageMessage::NotInfeasible);
    }

    Ok(report)
}

fn read_back(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| GridUtilError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn triage(content: &str) -> (TempDir, TriageReport) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MODEL_FILE_NAME), content).unwrap();
        let config = TriageConfig::new(dir.path());
        let report = write_iis(&config, &ProgressBar::hidden()).unwrap();
        (dir, report)
    }

    #[test]
    fn test_infeasible_model_writes_iis() {
        let (dir, report) = triage(
            "Minimize\n obj: x + y\nSubject To\n demand: x + y >= 10\n spare: x - y <= 100\nBounds\n x <= 3\n y <= 4\nEnd\n",
        );
        assert_eq!(report.status, Status::Infeasible);
        assert_eq!(report.messages[0], TriageMessage::Status(Status::Infeasible));
        assert!(report.messages.contains(&TriageMessage::ComputingIis));
        assert!(!report.messages.contains(&TriageMessage::NotInfeasible));

        let iis_path = dir.path().join(IIS_FILE_NAME);
        assert_eq!(report.iis_path.as_deref(), Some(iis_path.as_path()));
        assert!(iis_path.exists());

        let text = report.iis_text().unwrap();
        assert!(!text.is_empty());
        assert!(text.contains("demand:"));
        assert!(!text.contains("spare"));
        assert_eq!(text, fs::read_to_string(&iis_path).unwrap());
    }

    #[test]
    fn test_feasible_model_writes_nothing() {
        let (dir, report) = triage(
            "Maximize\n obj: 3 x + 2 y\nSubject To\n c1: x + y <= 4\n c2: x + 3 y <= 6\nEnd\n",
        );
        assert_eq!(report.status, Status::Optimal);
        assert_eq!(
            report.messages,
            vec![
                TriageMessage::Status(Status::Optimal),
                TriageMessage::NotInfeasible
            ]
        );
        assert!(report.iis_path.is_none());
        assert!(!dir.path().join(IIS_FILE_NAME).exists());
    }

    #[test]
    fn test_unbounded_model_reports_both_messages() {
        let (dir, report) = triage("Maximize\n obj: x + y\nSubject To\n c1: x - y <= 1\nEnd\n");
        assert_eq!(report.status, Status::Unbounded);
        assert_eq!(
            report.messages,
            vec![
                TriageMessage::Status(Status::Unbounded),
                TriageMessage::Unbounded,
                TriageMessage::NotInfeasible
            ]
        );
        assert!(!dir.path().join(IIS_FILE_NAME).exists());
    }

    #[test]
    fn test_node_limit_marks_iis_not_minimal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MODEL_FILE_NAME),
            "Minimize\n obj: x\nSubject To\n neg: x <= -1\n odd: 2 n - 2 m = 1\nGenerals\n n m\nEnd\n",
        )
        .unwrap();
        let config = TriageConfig::new(dir.path()).with_node_limit(20);
        let report = write_iis(&config, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.status, Status::Infeasible);
        assert!(report.messages.contains(&TriageMessage::IisNotMinimal));
        assert!(report.iis_text().unwrap().contains("not proven minimal"));
    }

    #[test]
    fn test_integer_unbounded_model_skips_iis() {
        let (dir, report) = triage(
            "Maximize\n obj: x + n\nSubject To\n c1: x - n >= 0\nGenerals\n n\nEnd\n",
        );
        assert_eq!(report.status, Status::Unbounded);
        assert_eq!(
            report.messages,
            vec![
                TriageMessage::Status(Status::Unbounded),
                TriageMessage::Unbounded,
                TriageMessage::NotInfeasible
            ]
        );
        assert!(!dir.path().join(IIS_FILE_NAME).exists());
    }

    #[test]
    fn test_custom_names() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("grid.lp"),
            "Minimize\n obj: p\nSubject To\n limit: p >= 5\nBounds\n p <= 2\nEnd\n",
        )
        .unwrap();
        let config = TriageConfig::new(dir.path())
            .with_model_file("grid.lp")
            .with_iis_file("grid.ilp");
        let report = write_iis(&config, &ProgressBar::hidden()).unwrap();
        assert_eq!(report.model_name, "grid");
        assert!(dir.path().join("grid.ilp").exists());
        assert_eq!(report.iis_entries.len(), 2);
    }

    #[test]
    fn test_missing_model_is_error() {
        let dir = TempDir::new().unwrap();
        let config = TriageConfig::new(dir.path());
        let result = write_iis(&config, &ProgressBar::hidden());
        assert!(matches!(result, Err(GridUtilError::FileNotFound { .. })));
    }

    #[test]
    fn test_malformed_model_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MODEL_FILE_NAME), "Minimize\n obj: x\nSubject To\n c: x >=\nEnd\n").unwrap();
        let result = write_iis(&TriageConfig::new(dir.path()), &ProgressBar::hidden());
        assert!(matches!(result, Err(GridUtilError::ParseError { .. })));
    }
}
