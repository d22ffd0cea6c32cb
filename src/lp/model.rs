//! # 线性 / 混合整数模型
//!
//! LP 文件读入后的内存表示。
//!
//! ## 约定
//! - 变量默认界为 `[0, +inf)`
//! - 约束与变量保持文件中的出现顺序
//! - 表达式中重复出现的变量会被合并
//!
//! ## 依赖关系
//! - 被 `lp/parser.rs`, `lp/writer.rs`, `lp/solver.rs`, `lp/iis.rs` 使用

use std::collections::HashMap;
use std::fmt;

/// 目标方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// 约束比较符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Le,
    Ge,
    Eq,
}

impl ConstraintSense {
    /// 检查 `lhs (op) rhs` 是否成立
    pub fn holds(self, lhs: f64, rhs: f64, tol: f64) -> bool {
        match self {
            ConstraintSense::Le => lhs <= rhs + tol,
            ConstraintSense::Ge => lhs >= rhs - tol,
            ConstraintSense::Eq => (lhs - rhs).abs() <= tol,
        }
    }
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSense::Le => write!(f, "<="),
            ConstraintSense::Ge => write!(f, ">="),
            ConstraintSense::Eq => write!(f, "="),
        }
    }
}

/// 决策变量
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: f64::INFINITY,
            integer: false,
        }
    }
}

/// 线性项: (变量下标, 系数)
pub type Term = (usize, f64);

/// 线性约束
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<Term>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

/// 目标函数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub name: Option<String>,
    pub terms: Vec<Term>,
    pub constant: f64,
}

/// 完整模型
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub objective: Objective,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    index: HashMap<String, usize>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 按名称查找变量，不存在时以默认界创建
    pub fn var_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.variables.len();
        self.variables.push(Variable::new(name));
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// 是否包含整数变量
    pub fn has_integers(&self) -> bool {
        self.variables.iter().any(|v| v.integer)
    }
}

/// 合并重复变量并去掉零系数项，保持首次出现顺序
pub fn merge_terms(terms: Vec<Term>) -> Vec<Term> {
    let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
    for (var, coeff) in terms {
        match merged.iter_mut().find(|(v, _)| *v == var) {
            Some(entry) => entry.1 += coeff,
            None => merged.push((var, coeff)),
        }
    }
    merged.retain(|&(_, c)| c != 0.0);
    merged
}
