//! # 批量执行器
//!
//! 在 rayon 线程池中并行诊断模型，汇总每个模型的求解状态。
//!
//! ## 功能
//! - 进度条实时显示 IIS / 其他 / 失败计数
//! - 按状态分类统计
//! - 失败模型与错误信息收集
//!
//! ## 依赖关系
//! - 被 `commands/iis.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{GridUtilError, Result};
use crate::lp::Status;
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 单个模型的诊断结果
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub model: PathBuf,
    pub status: Status,
    /// 写出的 IIS 文件
    pub iis_path: Option<PathBuf>,
}

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    Triaged(ModelOutcome),
    /// (模型路径, 错误信息)
    Failed(PathBuf, String),
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ModelOutcome>,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Triaged(outcome) => self.outcomes.push(outcome),
            ProcessResult::Failed(path, err) => self.failures.push((path, err)),
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    /// 写出 IIS 的模型数
    pub fn iis_written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.iis_path.is_some()).count()
    }

    /// 各状态的模型数，只包含出现过的状态
    pub fn status_counts(&self) -> Vec<(Status, usize)> {
        Status::ALL
            .iter()
            .map(|&status| {
                let n = self.outcomes.iter().filter(|o| o.status == status).count();
                (status, n)
            })
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器，0 表示使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行诊断模型列表
    pub fn run<F>(&self, models: Vec<PathBuf>, triage: F) -> Result<BatchResult>
    where
        F: Fn(&PathBuf) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(models.len() as u64, "Triaging models");

        let iis_count = AtomicUsize::new(0);
        let other_count = AtomicUsize::new(0);
        let failed_count = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| GridUtilError::Other(format!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            models
                .par_iter()
                .map(|model| {
                    let result = triage(model);

                    let counter = match &result {
                        ProcessResult::Triaged(o) if o.iis_path.is_some() => &iis_count,
                        ProcessResult::Triaged(_) => &other_count,
                        ProcessResult::Failed(_, _) => &failed_count,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);

                    pb.set_message(format!(
                        "{} IIS, {} other, {} failed",
                        iis_count.load(Ordering::Relaxed),
                        other_count.load(Ordering::Relaxed),
                        failed_count.load(Ordering::Relaxed)
                    ));
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: Status, iis: bool) -> ProcessResult {
        let model = PathBuf::from(name);
        ProcessResult::Triaged(ModelOutcome {
            iis_path: iis.then(|| model.with_extension("ilp")),
            model,
            status,
        })
    }

    #[test]
    fn test_run_groups_by_status() {
        let models: Vec<PathBuf> = (0..6).map(|i| PathBuf::from(format!("m{}.lp", i))).collect();
        let result = BatchRunner::new(2)
            .run(models, |model| {
                let name = model.display().to_string();
                match name.as_str() {
                    "m0.lp" => outcome(&name, Status::Optimal, false),
                    "m1.lp" => outcome(&name, Status::Unbounded, false),
                    "m5.lp" => ProcessResult::Failed(model.clone(), "bad".to_string()),
                    _ => outcome(&name, Status::Infeasible, true),
                }
            })
            .unwrap();

        assert_eq!(result.total(), 6);
        assert_eq!(result.iis_written(), 3);
        assert_eq!(
            result.status_counts(),
            vec![
                (Status::Optimal, 1),
                (Status::Infeasible, 3),
                (Status::Unbounded, 1)
            ]
        );
        assert_eq!(
            result.failures,
            vec![(PathBuf::from("m5.lp"), "bad".to_string())]
        );
    }
}
