//! # 求解器
//!
//! 使用 `minilp` 求解 LP 松弛，整数变量通过深度优先分支定界处理。
//!
//! ## 状态
//! - `OPTIMAL` (2), `INFEASIBLE` (3), `INF_OR_UNBD` (4), `UNBOUNDED` (5), `NODE_LIMIT` (8)
//! - 含整数变量且松弛无界时，先判定整数可行性：可行为 `UNBOUNDED`，不可行为 `INFEASIBLE`，
//!   节点数耗尽无法判定时为 `INF_OR_UNBD`
//! - minilp 对部分无界问题返回非有限的目标值或变量值，这些结果按无界处理
//!
//! ## 依赖关系
//! - 被 `lp/triage.rs`, `lp/iis.rs` 使用
//! - 使用 `lp/model.rs`
//! - 使用 `minilp` 求解线性规划

use crate::error::{GridUtilError, Result};
use crate::lp::model::{ConstraintSense, Model, ObjectiveSense};

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};
use std::fmt;

/// 整数性容差
const INT_TOL: f64 = 1e-6;
/// 可行性容差
const FEAS_TOL: f64 = 1e-9;

/// 求解终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Optimal,
    Infeasible,
    InfOrUnbd,
    Unbounded,
    NodeLimit,
}

impl Status {
    /// 按状态码排列
    pub const ALL: [Status; 5] = [
        Status::Optimal,
        Status::Infeasible,
        Status::InfOrUnbd,
        Status::Unbounded,
        Status::NodeLimit,
    ];

    /// 常用求解器约定的数值状态码
    pub fn code(self) -> u8 {
        match self {
            Status::Optimal => 2,
            Status::Infeasible => 3,
            Status::InfOrUnbd => 4,
            Status::Unbounded => 5,
            Status::NodeLimit => 8,
        }
    }

    /// 是否需要计算 IIS
    pub fn indicates_infeasibility(self) -> bool {
        matches!(self, Status::Infeasible | Status::InfOrUnbd)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Optimal => write!(f, "OPTIMAL"),
            Status::Infeasible => write!(f, "INFEASIBLE"),
            Status::InfOrUnbd => write!(f, "INF_OR_UNBD"),
            Status::Unbounded => write!(f, "UNBOUNDED"),
            Status::NodeLimit => write!(f, "NODE_LIMIT"),
        }
    }
}

/// 求解结果
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: Status,
    /// 最优（或最好的已知）目标值
    pub objective: Option<f64>,
    /// 变量取值，顺序与 `Model::variables` 一致
    pub values: Option<Vec<f64>>,
    /// 分支定界节点数（纯 LP 为 1）
    pub nodes: usize,
}

/// 可行性判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    Feasible,
    Infeasible,
    /// 节点数耗尽，无法判定
    Unknown,
}

/// 模型的一个子系统：启用的约束与变量界
#[derive(Debug, Clone)]
pub struct Subsystem {
    pub constraints: Vec<bool>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Subsystem {
    /// 包含全部约束与原始界
    pub fn full(model: &Model) -> Self {
        Self {
            constraints: vec![true; model.constraints.len()],
            lower: model.variables.iter().map(|v| v.lower).collect(),
            upper: model.variables.iter().map(|v| v.upper).collect(),
        }
    }
}

/// 求解器配置
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// 分支定界节点上限
    pub node_limit: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self { node_limit: 10_000 }
    }
}

/// LP 松弛结果
enum Relaxation {
    Optimal { objective: f64, values: Vec<f64> },
    Infeasible,
    Unbounded,
}

/// 分支定界结果
enum Search {
    Solved {
        objective: f64,
        values: Vec<f64>,
    },
    Infeasible,
    RelaxationUnbounded,
    NodeLimit {
        incumbent: Option<(f64, Vec<f64>)>,
    },
}

fn feasibility_of(search: Search) -> Feasibility {
    match search {
        Search::Solved { .. } => Feasibility::Feasible,
        Search::Infeasible => Feasibility::Infeasible,
        // 零目标下松弛不会无界
        Search::RelaxationUnbounded => Feasibility::Feasible,
        Search::NodeLimit { incumbent: Some(_) } => Feasibility::Feasible,
        Search::NodeLimit { incumbent: None } => Feasibility::Unknown,
    }
}

/// 模型求解器
pub struct Solver {
    options: SolverOptions,
}

impl Solver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// 求解完整模型
    pub fn optimize(&self, model: &Model) -> Result<SolveResult> {
        validate(model)?;

        let subsystem = Subsystem::full(model);
        let (search, nodes) = self.search(model, &subsystem, true);

        let result = match search {
            Search::Solved { objective, values } => SolveResult {
                status: Status::Optimal,
                objective: Some(objective),
                values: Some(values),
                nodes,
            },
            Search::Infeasible => SolveResult {
                status: Status::Infeasible,
                objective: None,
                values: None,
                nodes,
            },
            Search::RelaxationUnbounded if model.has_integers() => {
                let (feasibility, extra) = self.search(model, &subsystem, false);
                let status = match feasibility_of(feasibility) {
                    Feasibility::Feasible => Status::Unbounded,
                    Feasibility::Infeasible => Status::Infeasible,
                    Feasibility::Unknown => Status::InfOrUnbd,
                };
                SolveResult {
                    status,
                    objective: None,
                    values: None,
                    nodes: nodes + extra,
                }
            }
            Search::RelaxationUnbounded => SolveResult {
                status: Status::Unbounded,
                objective: None,
                values: None,
                nodes,
            },
            Search::NodeLimit { incumbent } => SolveResult {
                status: Status::NodeLimit,
                objective: incumbent.as_ref().map(|(obj, _)| *obj),
                values: incumbent.map(|(_, values)| values),
                nodes,
            },
        };

        Ok(result)
    }

    /// 判定子系统的可行性（忽略目标函数）
    pub fn check_feasibility(&self, model: &Model, subsystem: &Subsystem) -> Feasibility {
        feasibility_of(self.search(model, subsystem, false).0)
    }

    /// 深度优先分支定界
    fn search(&self, model: &Model, subsystem: &Subsystem, with_objective: bool) -> (Search, usize) {
        let maximize = with_objective && model.objective.sense == ObjectiveSense::Maximize;

        // 整数变量的界取整
        let mut root = subsystem.clone();
        for (j, v) in model.variables.iter().enumerate() {
            if v.integer {
                root.lower[j] = (root.lower[j] - INT_TOL).ceil();
                root.upper[j] = (root.upper[j] + INT_TOL).floor();
            }
        }

        let mut stack = vec![(root.lower, root.upper)];
        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        let mut nodes = 0;

        while let Some((lower, upper)) = stack.pop() {
            if nodes >= self.options.node_limit {
                return (Search::NodeLimit { incumbent }, nodes);
            }
            nodes += 1;

            let relaxation =
                solve_relaxation(model, &subsystem.constraints, &lower, &upper, with_objective);

            let (objective, values) = match relaxation {
                Relaxation::Infeasible => continue,
                Relaxation::Unbounded => return (Search::RelaxationUnbounded, nodes),
                Relaxation::Optimal { objective, values } => (objective, values),
            };

            // 界剪枝
            if let Some((best, _)) = &incumbent {
                let no_better = if maximize {
                    objective <= *best + FEAS_TOL
                } else {
                    objective >= *best - FEAS_TOL
                };
                if no_better {
                    continue;
                }
            }

            match most_fractional(model, &values) {
                None => {
                    if !with_objective {
                        return (Search::Solved { objective, values }, nodes);
                    }
                    incumbent = Some((objective, values));
                }
                Some(j) => {
                    let value = values[j];

                    let mut up_lower = lower.clone();
                    up_lower[j] = value.ceil();
                    stack.push((up_lower, upper.clone()));

                    let mut down_upper = upper;
                    down_upper[j] = value.floor();
                    stack.push((lower, down_upper));
                }
            }
        }

        let search = match incumbent {
            Some((objective, values)) => Search::Solved { objective, values },
            None => Search::Infeasible,
        };
        (search, nodes)
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SolverOptions::default())
    }
}

/// 检查系数是否有限
fn validate(model: &Model) -> Result<()> {
    let objective_ok = model.objective.terms.iter().all(|(_, c)| c.is_finite())
        && model.objective.constant.is_finite();
    if !objective_ok {
        return Err(GridUtilError::SolverFailed(
            "objective has a non-finite coefficient".to_string(),
        ));
    }

    for c in &model.constraints {
        if c.terms.iter().any(|(_, coeff)| !coeff.is_finite()) || !c.rhs.is_finite() {
            return Err(GridUtilError::SolverFailed(format!(
                "constraint '{}' has a non-finite coefficient",
                c.name
            )));
        }
    }

    Ok(())
}

/// 选择离整数最远的整数变量
fn most_fractional(model: &Model, values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (j, v) in model.variables.iter().enumerate() {
        if !v.integer {
            continue;
        }
        let frac = values[j] - values[j].floor();
        let distance = frac.min(1.0 - frac);
        if distance > INT_TOL && best.map_or(true, |(_, d)| distance > d) {
            best = Some((j, distance));
        }
    }
    best.map(|(j, _)| j)
}

fn to_op(sense: ConstraintSense) -> ComparisonOp {
    match sense {
        ConstraintSense::Le => ComparisonOp::Le,
        ConstraintSense::Ge => ComparisonOp::Ge,
        ConstraintSense::Eq => ComparisonOp::Eq,
    }
}

/// 用 minilp 求解 LP 松弛
fn solve_relaxation(
    model: &Model,
    active: &[bool],
    lower: &[f64],
    upper: &[f64],
    with_objective: bool,
) -> Relaxation {
    if lower.iter().zip(upper).any(|(l, u)| *l > *u + FEAS_TOL) {
        return Relaxation::Infeasible;
    }

    // 空约束直接判定
    for (c, _) in model
        .constraints
        .iter()
        .zip(active)
        .filter(|(c, on)| **on && c.terms.is_empty())
    {
        if !c.sense.holds(0.0, c.rhs, FEAS_TOL) {
            return Relaxation::Infeasible;
        }
    }

    let direction = if with_objective && model.objective.sense == ObjectiveSense::Maximize {
        OptimizationDirection::Maximize
    } else {
        OptimizationDirection::Minimize
    };
    let mut problem = Problem::new(direction);

    let mut costs = vec![0.0; model.variables.len()];
    if with_objective {
        for &(j, c) in &model.objective.terms {
            costs[j] += c;
        }
    }

    let vars: Vec<minilp::Variable> = (0..model.variables.len())
        .map(|j| problem.add_var(costs[j], (lower[j], upper[j].max(lower[j]))))
        .collect();

    for (c, _) in model
        .constraints
        .iter()
        .zip(active)
        .filter(|(c, on)| **on && !c.terms.is_empty())
    {
        let mut expr = LinearExpr::empty();
        for &(j, coeff) in &c.terms {
            expr.add(vars[j], coeff);
        }
        problem.add_constraint(expr, to_op(c.sense), c.rhs);
    }

    match problem.solve() {
        Ok(solution) => {
            let values: Vec<f64> = vars.iter().map(|v| *solution.var_value(*v)).collect();
            if !solution.objective().is_finite() || values.iter().any(|v| !v.is_finite()) {
                return Relaxation::Unbounded;
            }
            let constant = if with_objective {
                model.objective.constant
            } else {
                0.0
            };
            Relaxation::Optimal {
                objective: solution.objective() + constant,
                values,
            }
        }
        Err(minilp::Error::Infeasible) => Relaxation::Infeasible,
        Err(minilp::Error::Unbounded) => Relaxation::Unbounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::parser::parse_lp_content;

    fn solve(content: &str) -> SolveResult {
        let model = parse_lp_content(content, "test").unwrap();
        Solver::default().optimize(&model).unwrap()
    }

    #[test]
    fn test_optimal_lp() {
        let result = solve(
            "Maximize\n obj: 3 x + 2 y\nSubject To\n c1: x + y <= 4\n c2: x + 3 y <= 6\nBounds\n x <= 3\nEnd\n",
        );
        assert_eq!(result.status, Status::Optimal);
        assert!((result.objective.unwrap() - 11.0).abs() < 1e-6);
        let values = result.values.unwrap();
        assert!((values[0] - 3.0).abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_objective_constant() {
        let result = solve("Minimize\n obj: x + 5\nSubject To\n c: x >= 2\nEnd\n");
        assert!((result.objective.unwrap() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_lp() {
        let result = solve(
            "Minimize\n obj: x + y\nSubject To\n demand: x + y >= 10\nBounds\n x <= 3\n y <= 4\nEnd\n",
        );
        assert_eq!(result.status, Status::Infeasible);
        assert!(result.status.indicates_infeasibility());
        assert!(result.values.is_none());
    }

    #[test]
    fn test_unbounded_lp() {
        let result = solve("Maximize\n obj: x + y\nSubject To\n c1: x - y <= 1\nEnd\n");
        assert_eq!(result.status, Status::Unbounded);
        assert!(!result.status.indicates_infeasibility());
    }

    #[test]
    fn test_integer_program() {
        let result = solve(
            "Maximize\n obj: x + y\nSubject To\n c1: 2 x + 2 y <= 5\nGenerals\n x y\nEnd\n",
        );
        assert_eq!(result.status, Status::Optimal);
        assert!((result.objective.unwrap() - 2.0).abs() < 1e-6);
        assert!(result.nodes > 1);
    }

    #[test]
    fn test_integer_infeasible_with_feasible_relaxation() {
        let result = solve("Minimize\n obj: n\nSubject To\n c1: 2 n = 1\nGenerals\n n\nEnd\n");
        assert_eq!(result.status, Status::Infeasible);
    }

    #[test]
    fn test_unbounded_lp_values_not_reported() {
        let result = solve("Maximize\n obj: x + y\nSubject To\n c1: x - y <= 1\nEnd\n");
        assert!(result.objective.is_none());
        assert!(result.values.is_none());
    }

    #[test]
    fn test_unbounded_integer_program() {
        let result = solve(
            "Maximize\n obj: x + n\nSubject To\n c1: x - n >= 0\nGenerals\n n\nEnd\n",
        );
        assert_eq!(result.status, Status::Unbounded);
        assert!(!result.status.indicates_infeasibility());
        assert!(result.objective.is_none());
    }

    #[test]
    fn test_unbounded_relaxation_with_infeasible_integers() {
        let result = solve(
            "Maximize\n obj: x\nSubject To\n half: 2 n = 1\nGenerals\n n\nEnd\n",
        );
        assert_eq!(result.status, Status::Infeasible);
    }

    #[test]
    fn test_unbounded_relaxation_undecided_integers() {
        // 2 n - 2 m = 1 无整数解，但分支定界无法在有限节点内证明
        let model = parse_lp_content(
            "Maximize\n obj: x\nSubject To\n odd: 2 n - 2 m = 1\nGenerals\n n m\nEnd\n",
            "test",
        )
        .unwrap();
        let solver = Solver::new(SolverOptions { node_limit: 20 });
        let result = solver.optimize(&model).unwrap();
        assert_eq!(result.status, Status::InfOrUnbd);
        assert_eq!(result.status.code(), 4);
        assert!(result.status.indicates_infeasibility());
    }

    #[test]
    fn test_node_limit() {
        let model = parse_lp_content(
            "Maximize\n obj: x + y\nSubject To\n c1: 2 x + 2 y <= 5\nGenerals\n x y\nEnd\n",
            "test",
        )
        .unwrap();
        let solver = Solver::new(SolverOptions { node_limit: 1 });
        let result = solver.optimize(&model).unwrap();
        assert_eq!(result.status, Status::NodeLimit);
        assert_eq!(result.status.code(), 8);
    }

    #[test]
    fn test_crossed_bounds_and_empty_rows() {
        let crossed = solve("Minimize\n obj: x\nSubject To\n c: x >= 0\nBounds\n 3 <= x <= 1\nEnd\n");
        assert_eq!(crossed.status, Status::Infeasible);

        let empty_row = solve("Minimize\n obj: x\nSubject To\n c: 0 x >= 1\nEnd\n");
        assert_eq!(empty_row.status, Status::Infeasible);
    }

    #[test]
    fn test_feasibility_ignores_objective() {
        let model =
            parse_lp_content("Maximize\n obj: x\nSubject To\n c1: x >= 1\nEnd\n", "test").unwrap();
        let solver = Solver::default();
        assert_eq!(solver.optimize(&model).unwrap().status, Status::Unbounded);
        assert_eq!(
            solver.check_feasibility(&model, &Subsystem::full(&model)),
            Feasibility::Feasible
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Optimal.code(), 2);
        assert_eq!(Status::Infeasible.code(), 3);
        assert_eq!(Status::InfOrUnbd.code(), 4);
        assert_eq!(Status::Unbounded.code(), 5);
        assert_eq!(Status::InfOrUnbd.to_string(), "INF_OR_UNBD");
    }
}
