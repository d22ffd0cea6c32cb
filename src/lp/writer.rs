//! # LP 格式输出
//!
//! 将 `Model` 序列化为 LP 文本。IIS 子模型同样以此格式写出（`.ilp` 文件）。
//!
//! ## 依赖关系
//! - 被 `lp/iis.rs` 调用
//! - 使用 `lp/model.rs`

use crate::lp::model::{Model, ObjectiveSense, Term, Variable};

use std::fmt::Write as _;

/// 格式化数值
pub fn fmt_number(v: f64) -> String {
    if v == f64::INFINITY {
        "+infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-infinity".to_string()
    } else {
        format!("{}", v)
    }
}

/// 格式化线性表达式
pub fn fmt_expr(terms: &[Term], variables: &[Variable], constant: f64) -> String {
    let mut out = String::new();

    for (i, &(var, coeff)) in terms.iter().enumerate() {
        let name = &variables[var].name;
        let sign = if coeff < 0.0 { "-" } else { "+" };
        let magnitude = coeff.abs();

        if i == 0 {
            if coeff < 0.0 {
                out.push_str("- ");
            }
        } else {
            let _ = write!(out, " {} ", sign);
        }

        if magnitude == 1.0 {
            out.push_str(name);
        } else {
            let _ = write!(out, "{} {}", fmt_number(magnitude), name);
        }
    }

    if constant != 0.0 || terms.is_empty() {
        if terms.is_empty() {
            out.push_str(&fmt_number(constant));
        } else if constant < 0.0 {
            let _ = write!(out, " - {}", fmt_number(-constant));
        } else {
            let _ = write!(out, " + {}", fmt_number(constant));
        }
    }

    out
}

/// 所有有限界都显式写出，包括默认下界 0
fn fmt_bound(var: &Variable) -> String {
    let name = &var.name;
    match (var.lower.is_finite(), var.upper.is_finite()) {
        (false, false) => format!("{} free", name),
        (true, true) if var.lower == var.upper => format!("{} = {}", name, fmt_number(var.lower)),
        (true, true) => format!(
            "{} <= {} <= {}",
            fmt_number(var.lower),
            name,
            fmt_number(var.upper)
        ),
        (true, false) => format!("{} >= {}", name, fmt_number(var.lower)),
        (false, true) => format!("-infinity <= {} <= {}", name, fmt_number(var.upper)),
    }
}

/// 生成 LP 文本
pub fn to_lp_string(model: &Model) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\\ Model {}", model.name);
    let _ = writeln!(
        out,
        "\\ LP format - for model browsing. Use MPS format to capture full model detail."
    );

    // 目标函数
    match model.objective.sense {
        ObjectiveSense::Minimize => out.push_str("Minimize\n"),
        ObjectiveSense::Maximize => out.push_str("Maximize\n"),
    }
    let objective = &model.objective;
    if !objective.terms.is_empty() || objective.constant != 0.0 {
        let name = objective.name.as_deref().unwrap_or("obj");
        let _ = writeln!(
            out,
            " {}: {}",
            name,
            fmt_expr(&objective.terms, &model.variables, objective.constant)
        );
    }

    // 约束
    out.push_str("Subject To\n");
    for c in &model.constraints {
        let _ = writeln!(
            out,
            " {}: {} {} {}",
            c.name,
            fmt_expr(&c.terms, &model.variables, 0.0),
            c.sense,
            fmt_number(c.rhs)
        );
    }

    // 变量界
    if !model.variables.is_empty() {
        out.push_str("Bounds\n");
        for v in &model.variables {
            let _ = writeln!(out, " {}", fmt_bound(v));
        }
    }

    // 整数变量
    let integers: Vec<&str> = model
        .variables
        .iter()
        .filter(|v| v.integer)
        .map(|v| v.name.as_str())
        .collect();
    if !integers.is_empty() {
        out.push_str("Generals\n");
        for name in integers {
            let _ = writeln!(out, " {}", name);
        }
    }

    out.push_str("End\n");
    out
}
