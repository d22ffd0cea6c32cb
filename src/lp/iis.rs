//! # IIS 计算
//!
//! 使用删除过滤法 (deletion filter) 计算不可约不可行子系统。
//!
//! ## 算法
//! 1. 候选元素：所有约束、所有有限下界、所有有限上界（整数性不参与）
//! 2. 依次尝试删除每个元素：删除后仍不可行则永久删除，否则保留
//! 3. 剩余元素即为 IIS，删除其中任意一个都会使其可行
//!
//! 可行性判定使用零目标，无界不会掩盖不可行。
//!
//! ## 依赖关系
//! - 被 `lp/triage.rs` 调用
//! - 使用 `lp/solver.rs` 判定可行性
//! - 使用 `lp/writer.rs` 写出 `.ilp` 文本
//! - 使用 `indicatif` 显示进度

use crate::error::{GridUtilError, Result};
use crate::lp::model::{Constraint, Model};
use crate::lp::solver::{Feasibility, Solver, Subsystem};
use crate::lp::writer;

use indicatif::ProgressBar;

/// 过滤中出现无法判定的子系统时写入 `.ilp` 的注释
pub const NOT_MINIMAL_NOTE: &str = "\\ IIS not proven minimal: node limit reached during filtering";

/// IIS 候选元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    Constraint(usize),
    Lower(usize),
    Upper(usize),
}

/// IIS 结果
#[derive(Debug, Clone, Default)]
pub struct IisReport {
    /// IIS 中的约束下标
    pub constraints: Vec<usize>,
    /// IIS 中的下界（变量下标）
    pub lower_bounds: Vec<usize>,
    /// IIS 中的上界（变量下标）
    pub upper_bounds: Vec<usize>,
    /// 过滤过程中是否所有判定都有结论
    pub minimal: bool,
}

/// IIS 表格中的一行
#[derive(Debug, Clone)]
pub struct IisEntry {
    pub kind: &'static str,
    pub name: String,
    pub detail: String,
}

/// 计算 IIS
pub fn compute_iis(model: &Model, solver: &Solver, pb: &ProgressBar) -> Result<IisReport> {
    let mut subsystem = Subsystem::full(model);

    match solver.check_feasibility(model, &subsystem) {
        Feasibility::Feasible => return Err(GridUtilError::ModelFeasible),
        Feasibility::Unknown => {
            return Err(GridUtilError::SolverFailed(
                "node limit reached before infeasibility was proven".to_string(),
            ))
        }
        Feasibility::Infeasible => {}
    }

    let mut candidates: Vec<Member> = (0..model.constraints.len())
        .map(Member::Constraint)
        .collect();
    for (j, v) in model.variables.iter().enumerate() {
        if v.lower.is_finite() {
            candidates.push(Member::Lower(j));
        }
        if v.upper.is_finite() {
            candidates.push(Member::Upper(j));
        }
    }

    pb.set_length(candidates.len() as u64);

    let mut kept = Vec::new();
    let mut minimal = true;

    for member in candidates {
        let saved = remove(&mut subsystem, member);

        match solver.check_feasibility(model, &subsystem) {
            Feasibility::Infeasible => {}
            verdict => {
                if verdict == Feasibility::Unknown {
                    minimal = false;
                }
                restore(&mut subsystem, member, saved);
                kept.push(member);
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    let mut report = IisReport {
        minimal,
        ..Default::default()
    };
    for member in kept {
        match member {
            Member::Constraint(i) => report.constraints.push(i),
            Member::Lower(j) => report.lower_bounds.push(j),
            Member::Upper(j) => report.upper_bounds.push(j),
        }
    }
    Ok(report)
}

fn remove(subsystem: &mut Subsystem, member: Member) -> f64 {
    match member {
        Member::Constraint(i) => {
            subsystem.constraints[i] = false;
            0.0
        }
        Member::Lower(j) => std::mem::replace(&mut subsystem.lower[j], f64::NEG_INFINITY),
        Member::Upper(j) => std::mem::replace(&mut subsystem.upper[j], f64::INFINITY),
    }
}

fn restore(subsystem: &mut Subsystem, member: Member, saved: f64) {
    match member {
        Member::Constraint(i) => subsystem.constraints[i] = true,
        Member::Lower(j) => subsystem.lower[j] = saved,
        Member::Upper(j) => subsystem.upper[j] = saved,
    }
}

impl IisReport {
    /// IIS 元素总数
    pub fn len(&self) -> usize {
        self.constraints.len() + self.lower_bounds.len() + self.upper_bounds.len()
    }

    /// 构造仅含 IIS 元素的子模型，未入选的界放开为无穷
    pub fn to_submodel(&self, model: &Model) -> Model {
        let mut involved = vec![false; model.variables.len()];
        for &i in &self.constraints {
            for &(j, _) in &model.constraints[i].terms {
                involved[j] = true;
            }
        }
        for &j in self.lower_bounds.iter().chain(&self.upper_bounds) {
            involved[j] = true;
        }

        let mut sub = Model::new(model.name.clone());
        let mut remap = vec![usize::MAX; model.variables.len()];
        for (j, v) in model.variables.iter().enumerate() {
            if !involved[j] {
                continue;
            }
            let k = sub.var_index(&v.name);
            remap[j] = k;
            let var = &mut sub.variables[k];
            var.integer = v.integer;
            var.lower = if self.lower_bounds.contains(&j) {
                v.lower
            } else {
                f64::NEG_INFINITY
            };
            var.upper = if self.upper_bounds.contains(&j) {
                v.upper
            } else {
                f64::INFINITY
            };
        }

        for &i in &self.constraints {
            let c = &model.constraints[i];
            sub.add_constraint(Constraint {
                name: c.name.clone(),
                terms: c.terms.iter().map(|&(j, coeff)| (remap[j], coeff)).collect(),
                sense: c.sense,
                rhs: c.rhs,
            });
        }

        sub
    }

    /// 生成 `.ilp` 文本；未证明极小时在开头加注释
    pub fn to_ilp_string(&self, model: &Model) -> String {
        let text = writer::to_lp_string(&self.to_submodel(model));
        if self.minimal {
            text
        } else {
            format!("{}\n{}", NOT_MINIMAL_NOTE, text)
        }
    }

    /// 表格摘要
    pub fn entries(&self, model: &Model) -> Vec<IisEntry> {
        let mut entries = Vec::with_capacity(self.len());

        for &i in &self.constraints {
            let c = &model.constraints[i];
            entries.push(IisEntry {
                kind: "constraint",
                name: c.name.clone(),
                detail: format!(
                    "{} {} {}",
                    writer::fmt_expr(&c.terms, &model.variables, 0.0),
                    c.sense,
                    writer::fmt_number(c.rhs)
                ),
            });
        }
        for &j in &self.lower_bounds {
            let v = &model.variables[j];
            entries.push(IisEntry {
                kind: "lower bound",
                name: v.name.clone(),
                detail: format!("{} >= {}", v.name, writer::fmt_number(v.lower)),
            });
        }
        for &j in &self.upper_bounds {
            let v = &model.variables[j];
            entries.push(IisEntry {
                kind: "upper bound",
                name: v.name.clone(),
                detail: format!("{} <= {}", v.name, writer::fmt_number(v.upper)),
            });
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::parser::parse_lp_content;
    use crate::lp::solver::SolverOptions;

    const INFEASIBLE: &str = r#"
Minimize
 obj: x + y + z
Subject To
 demand: x + y >= 10
 cap: x + y <= 20
 other: z >= 1
Bounds
 x <= 3
 y <= 4
 z <= 5
End
"#;

    fn iis_of(content: &str) -> (Model, IisReport) {
        let model = parse_lp_content(content, "test").unwrap();
        let report = compute_iis(&model, &Solver::default(), &ProgressBar::hidden()).unwrap();
        (model, report)
    }

    #[test]
    fn test_iis_isolates_conflict() {
        let (model, report) = iis_of(INFEASIBLE);
        let names: Vec<&str> = report
            .constraints
            .iter()
            .map(|&i| model.constraints[i].name.as_str())
            .collect();
        assert_eq!(names, vec!["demand"]);
        assert!(report.lower_bounds.is_empty());
        assert_eq!(report.upper_bounds.len(), 2);
        assert!(report.minimal);
    }

    #[test]
    fn test_iis_is_irreducible() {
        let (model, report) = iis_of(INFEASIBLE);
        let solver = Solver::default();
        let sub = report.to_submodel(&model);

        assert_eq!(
            solver.check_feasibility(&sub, &Subsystem::full(&sub)),
            Feasibility::Infeasible
        );

        // 删除任意一个约束后可行
        for i in 0..sub.constraints.len() {
            let mut subsystem = Subsystem::full(&sub);
            subsystem.constraints[i] = false;
            assert_eq!(solver.check_feasibility(&sub, &subsystem), Feasibility::Feasible);
        }
        // 放开任意一个上界后可行
        for j in 0..sub.variables.len() {
            if sub.variables[j].upper.is_finite() {
                let mut subsystem = Subsystem::full(&sub);
                subsystem.upper[j] = f64::INFINITY;
                assert_eq!(solver.check_feasibility(&sub, &subsystem), Feasibility::Feasible);
            }
        }
    }

    #[test]
    fn test_ilp_text() {
        let (model, report) = iis_of(INFEASIBLE);
        let text = report.to_ilp_string(&model);
        assert!(text.starts_with("\\ Model test"));
        assert!(text.contains(" demand: x + y >= 10"));
        assert!(text.contains(" -infinity <= x <= 3"));
        assert!(text.contains(" -infinity <= y <= 4"));
        assert!(!text.contains(" cap:"));
        assert!(!text.contains(" z"));
        assert!(text.trim_end().ends_with("End"));
    }

    #[test]
    fn test_iis_with_integers() {
        let (model, report) = iis_of(
            "Minimize\n obj: n\nSubject To\n half: 2 n = 1\n loose: n <= 10\nGenerals\n n\nEnd\n",
        );
        assert_eq!(report.constraints.len(), 1);
        assert_eq!(model.constraints[report.constraints[0]].name, "half");
        let text = report.to_ilp_string(&model);
        assert!(text.contains("Generals\n n\n"));
    }

    #[test]
    fn test_feasible_model_rejected() {
        let model =
            parse_lp_content("Minimize\n obj: x\nSubject To\n c: x >= 1\nEnd\n", "test").unwrap();
        let result = compute_iis(&model, &Solver::default(), &ProgressBar::hidden());
        assert!(matches!(result, Err(GridUtilError::ModelFeasible)));
    }

    #[test]
    fn test_undecided_member_kept_and_flagged() {
        // 删除 neg 后只剩 odd，2 n - 2 m = 1 在节点上限内无法判定
        let model = parse_lp_content(
            "Minimize\n obj: x\nSubject To\n neg: x <= -1\n odd: 2 n - 2 m = 1\nGenerals\n n m\nEnd\n",
            "test",
        )
        .unwrap();
        let solver = Solver::new(SolverOptions { node_limit: 20 });
        let report = compute_iis(&model, &solver, &ProgressBar::hidden()).unwrap();

        assert!(!report.minimal);
        let names: Vec<&str> = report
            .constraints
            .iter()
            .map(|&i| model.constraints[i].name.as_str())
            .collect();
        assert_eq!(names, vec!["neg"]);
        assert_eq!(report.lower_bounds, vec![0]);

        let text = report.to_ilp_string(&model);
        assert!(text.starts_with(NOT_MINIMAL_NOTE));
        assert!(parse_lp_content(&text, "test").is_ok());
    }

    #[test]
    fn test_entries() {
        let (model, report) = iis_of(INFEASIBLE);
        let entries = report.entries(&model);
        assert_eq!(entries.len(), report.len());
        assert_eq!(entries[0].kind, "constraint");
        assert_eq!(entries[0].detail, "x + y >= 10");
    }
}
