//! # LP 格式解析器
//!
//! 解析常见求解器使用的 LP 文本格式。
//!
//! ## LP 格式说明
//! ```text
//! \ 注释
//! Minimize
//!  obj: 3 x + 2 y
//! Subject To
//!  c1: x + y >= 10
//!  c2: x - y
//!      <= 2
//! Bounds
//!  x <= 8
//!  -5 <= y <= 5
//!  z free
//! Generals
//!  n
//! Binaries
//!  b
//! End
//! ```
//!
//! ## 不支持
//! - 二次项 (`[ ... ]`)
//! - semi-continuous / SOS 段
//!
//! ## 依赖关系
//! - 被 `lp/triage.rs` 使用
//! - 使用 `lp/model.rs`
//! - 使用 `regex` 识别段标题

use crate::error::{GridUtilError, Result};
use crate::lp::model::{merge_terms, Constraint, ConstraintSense, Model, ObjectiveSense};

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// 解析 LP 文件
pub fn parse_lp_file(path: &Path) -> Result<Model> {
    if !path.exists() {
        return Err(GridUtilError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| GridUtilError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");

    parse_lp_content(&content, name).map_err(|e| match e {
        GridUtilError::LpSyntax { line, reason } => GridUtilError::ParseError {
            format: "LP".to_string(),
            path: path.display().to_string(),
            reason: format!("line {}: {}", line, reason),
        },
        other => other,
    })
}

/// 从字符串内容解析 LP 格式
pub fn parse_lp_content(content: &str, name: &str) -> Result<Model> {
    let sections = split_sections(content)?;
    let mut model = Model::new(name);

    for section in sections {
        let tokens = tokenize(&section.lines)?;
        let mut stream = TokenStream::new(tokens, section.header_line);
        match section.kind {
            SectionKind::Objective(sense) => parse_objective(&mut stream, sense, &mut model)?,
            SectionKind::Constraints => parse_constraints(&mut stream, &mut model)?,
            SectionKind::Bounds => parse_bounds(&mut stream, &mut model)?,
            SectionKind::Generals => parse_integers(&mut stream, &mut model, false)?,
            SectionKind::Binaries => parse_integers(&mut stream, &mut model, true)?,
        }
    }

    Ok(model)
}

// ─────────────────────────────────────────────────────────────
// 段划分
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum SectionKind {
    Objective(ObjectiveSense),
    Constraints,
    Bounds,
    Generals,
    Binaries,
}

struct Section {
    kind: SectionKind,
    header_line: usize,
    /// (行号, 内容)
    lines: Vec<(usize, String)>,
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(minimize|minimise|minimum|min|maximize|maximise|maximum|max|subject\s+to|such\s+that|s\.t\.|st|bounds|bound|generals|general|gen|integers|integer|binaries|binary|bin|semi-continuous|semis|semi|sos|end)(?:\s+(.*?))?\s*$",
        )
        .expect("LP header pattern is valid")
    })
}

/// 段标题独占一行，只有目标段标题后可以直接跟表达式。
/// `gen + load >= 2` 这类以关键字命名变量开头的行属于当前段。
fn is_section_header(keyword: &str, rest: &str) -> bool {
    if rest.is_empty() {
        return true;
    }
    let keyword = keyword.to_ascii_lowercase();
    let objective = keyword.starts_with("min") || keyword.starts_with("max");
    objective && !rest.starts_with(|c: char| DELIMITERS.contains(c))
}

fn classify_header(keyword: &str, line: usize) -> Result<Option<SectionKind>> {
    let keyword = keyword.to_lowercase();
    let keyword: String = keyword.split_whitespace().collect::<Vec<_>>().join(" ");

    let kind = match keyword.as_str() {
        "minimize" | "minimise" | "minimum" | "min" => {
            SectionKind::Objective(ObjectiveSense::Minimize)
        }
        "maximize" | "maximise" | "maximum" | "max" => {
            SectionKind::Objective(ObjectiveSense::Maximize)
        }
        "subject to" | "such that" | "s.t." | "st" => SectionKind::Constraints,
        "bounds" | "bound" => SectionKind::Bounds,
        "generals" | "general" | "gen" | "integers" | "integer" => SectionKind::Generals,
        "binaries" | "binary" | "bin" => SectionKind::Binaries,
        "end" => return Ok(None),
        other => {
            return Err(GridUtilError::LpSyntax {
                line,
                reason: format!("unsupported section '{}'", other),
            })
        }
    };
    Ok(Some(kind))
}

fn split_sections(content: &str) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        // `\` 之后为注释
        let text = match raw.find('\\') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        if text.trim().is_empty() {
            continue;
        }

        if let Some(caps) = header_regex().captures(text) {
            let keyword = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

            if is_section_header(keyword, rest) {
                match classify_header(keyword, line_no)? {
                    Some(kind) => {
                        let mut section = Section {
                            kind,
                            header_line: line_no,
                            lines: Vec::new(),
                        };
                        if !rest.is_empty() {
                            section.lines.push((line_no, rest.to_string()));
                        }
                        sections.push(section);
                        continue;
                    }
                    // End: 之后的内容全部忽略
                    None => break,
                }
            }
        }

        match sections.last_mut() {
            Some(section) => section.lines.push((line_no, text.to_string())),
            None => {
                return Err(GridUtilError::LpSyntax {
                    line: line_no,
                    reason: "content before the objective section".to_string(),
                })
            }
        }
    }

    Ok(sections)
}

// ─────────────────────────────────────────────────────────────
// 词法分析
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Cmp(ConstraintSense),
    Plus,
    Minus,
    Colon,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
}

const DELIMITERS: &str = "+-:<>=[]^";

fn tokenize(lines: &[(usize, String)]) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    for (line, text) in lines {
        let line = *line;
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            let tok = match c {
                '+' => {
                    i += 1;
                    Tok::Plus
                }
                '-' => {
                    i += 1;
                    Tok::Minus
                }
                ':' => {
                    i += 1;
                    Tok::Colon
                }
                '<' | '>' | '=' => {
                    let next = chars.get(i + 1).copied();
                    let (sense, width) = match (c, next) {
                        ('<', Some('=')) | ('=', Some('<')) => (ConstraintSense::Le, 2),
                        ('>', Some('=')) | ('=', Some('>')) => (ConstraintSense::Ge, 2),
                        ('<', _) => (ConstraintSense::Le, 1),
                        ('>', _) => (ConstraintSense::Ge, 1),
                        _ => (ConstraintSense::Eq, 1),
                    };
                    i += width;
                    Tok::Cmp(sense)
                }
                '[' | ']' | '^' => {
                    return Err(GridUtilError::LpSyntax {
                        line,
                        reason: "quadratic terms are not supported".to_string(),
                    });
                }
                _ if c.is_ascii_digit() || c == '.' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                        i += 1;
                    }
                    // 指数部分: e/E 后必须跟数字（可带符号）
                    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                        let mut j = i + 1;
                        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                            j += 1;
                        }
                        if j < chars.len() && chars[j].is_ascii_digit() {
                            while j < chars.len() && chars[j].is_ascii_digit() {
                                j += 1;
                            }
                            i = j;
                        }
                    }
                    let text: String = chars[start..i].iter().collect();
                    let value = text.parse::<f64>().map_err(|_| GridUtilError::LpSyntax {
                        line,
                        reason: format!("invalid number '{}'", text),
                    })?;
                    Tok::Num(value)
                }
                _ => {
                    let start = i;
                    while i < chars.len()
                        && !chars[i].is_whitespace()
                        && !DELIMITERS.contains(chars[i])
                    {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    match word.to_lowercase().as_str() {
                        "inf" | "infinity" => Tok::Num(f64::INFINITY),
                        _ => Tok::Ident(word),
                    }
                }
            };

            tokens.push(Token { tok, line });
        }
    }

    Ok(tokens)
}

// ─────────────────────────────────────────────────────────────
// 语法分析
// ─────────────────────────────────────────────────────────────

struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    fallback_line: usize,
}

impl TokenStream {
    fn new(tokens: Vec<Token>, fallback_line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            fallback_line,
        }
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(self.fallback_line)
    }

    fn error<T>(&self, reason: impl Into<String>) -> Result<T> {
        Err(GridUtilError::LpSyntax {
            line: self.line(),
            reason: reason.into(),
        })
    }

    /// `name :` 形式的标签
    fn take_label(&mut self) -> Option<String> {
        if let (Some(Tok::Ident(name)), Some(Tok::Colon)) = (self.peek(), self.peek_at(1)) {
            let name = name.clone();
            self.pos += 2;
            Some(name)
        } else {
            None
        }
    }

    fn take_signs(&mut self) -> (f64, bool) {
        let mut sign = 1.0;
        let mut seen = false;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Plus => {}
                Tok::Minus => sign = -sign,
                _ => break,
            }
            seen = true;
            self.pos += 1;
        }
        (sign, seen)
    }

    fn expect_cmp(&mut self) -> Result<ConstraintSense> {
        match self.peek() {
            Some(Tok::Cmp(sense)) => {
                let sense = *sense;
                self.pos += 1;
                Ok(sense)
            }
            Some(other) => self.error(format!("expected comparison operator, found {:?}", other)),
            None => self.error("expected comparison operator, found end of section"),
        }
    }

    fn expect_number(&mut self) -> Result<f64> {
        let (sign, _) = self.take_signs();
        match self.next() {
            Some(Tok::Num(v)) => Ok(sign * v),
            Some(other) => {
                self.pos -= 1;
                self.error(format!("expected number, found {:?}", other))
            }
            None => self.error("expected number, found end of section"),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Tok::Ident(name)) => Ok(name),
            Some(other) => {
                self.pos -= 1;
                self.error(format!("expected variable name, found {:?}", other))
            }
            None => self.error("expected variable name, found end of section"),
        }
    }

    /// 解析线性表达式，返回 (项, 常数)
    fn parse_expr(&mut self) -> Result<(Vec<(String, f64)>, f64)> {
        let mut terms = Vec::new();
        let mut constant = 0.0;

        loop {
            let (sign, signed) = self.take_signs();
            match self.peek().cloned() {
                Some(Tok::Num(v)) => {
                    self.pos += 1;
                    let is_term = matches!(self.peek(), Some(Tok::Ident(_)))
                        && !matches!(self.peek_at(1), Some(Tok::Colon));
                    if is_term {
                        let name = self.expect_ident()?;
                        terms.push((name, sign * v));
                    } else {
                        constant += sign * v;
                    }
                }
                Some(Tok::Ident(name)) if !matches!(self.peek_at(1), Some(Tok::Colon)) => {
                    self.pos += 1;
                    terms.push((name, sign));
                }
                _ => {
                    if signed {
                        return self.error("dangling sign in expression");
                    }
                    break;
                }
            }

            if !matches!(self.peek(), Some(Tok::Plus) | Some(Tok::Minus)) {
                break;
            }
        }

        Ok((terms, constant))
    }
}

fn resolve_terms(model: &mut Model, terms: Vec<(String, f64)>) -> Vec<(usize, f64)> {
    let indexed = terms
        .into_iter()
        .map(|(name, coeff)| (model.var_index(&name), coeff))
        .collect();
    merge_terms(indexed)
}

fn parse_objective(stream: &mut TokenStream, sense: ObjectiveSense, model: &mut Model) -> Result<()> {
    model.objective.sense = sense;
    model.objective.name = stream.take_label();

    let (terms, constant) = stream.parse_expr()?;
    model.objective.terms = resolve_terms(model, terms);
    model.objective.constant = constant;

    if !stream.is_eof() {
        return stream.error("unexpected token in objective");
    }
    Ok(())
}

fn parse_constraints(stream: &mut TokenStream, model: &mut Model) -> Result<()> {
    while !stream.is_eof() {
        let name = stream
            .take_label()
            .unwrap_or_else(|| format!("R{}", model.constraints.len()));

        let (terms, constant) = stream.parse_expr()?;
        let sense = stream.expect_cmp()?;
        let rhs = stream.expect_number()?;

        if !rhs.is_finite() {
            return stream.error(format!("constraint '{}' has an infinite right-hand side", name));
        }

        let terms = resolve_terms(model, terms);
        model.add_constraint(Constraint {
            name,
            terms,
            sense,
            rhs: rhs - constant,
        });
    }
    Ok(())
}

/// 应用 `x (op) value`
fn apply_bound(model: &mut Model, var: usize, sense: ConstraintSense, value: f64) {
    let v = &mut model.variables[var];
    match sense {
        ConstraintSense::Le => v.upper = value,
        ConstraintSense::Ge => v.lower = value,
        ConstraintSense::Eq => {
            v.lower = value;
            v.upper = value;
        }
    }
}

/// `value (op) x` 等价于 `x (op 反向) value`
fn flip(sense: ConstraintSense) -> ConstraintSense {
    match sense {
        ConstraintSense::Le => ConstraintSense::Ge,
        ConstraintSense::Ge => ConstraintSense::Le,
        ConstraintSense::Eq => ConstraintSense::Eq,
    }
}

fn parse_bounds(stream: &mut TokenStream, model: &mut Model) -> Result<()> {
    while let Some(tok) = stream.peek().cloned() {
        match tok {
            Tok::Plus | Tok::Minus | Tok::Num(_) => {
                // l <= x [<= u]
                let value = stream.expect_number()?;
                let sense = stream.expect_cmp()?;
                let name = stream.expect_ident()?;
                let var = model.var_index(&name);
                apply_bound(model, var, flip(sense), value);

                if let Some(Tok::Cmp(_)) = stream.peek() {
                    let sense = stream.expect_cmp()?;
                    let value = stream.expect_number()?;
                    apply_bound(model, var, sense, value);
                }
            }
            Tok::Ident(name) => {
                stream.next();
                let var = model.var_index(&name);
                let is_free = matches!(
                    stream.peek(),
                    Some(Tok::Ident(word)) if word.eq_ignore_ascii_case("free")
                );
                if is_free {
                    stream.next();
                    model.variables[var].lower = f64::NEG_INFINITY;
                    model.variables[var].upper = f64::INFINITY;
                } else {
                    let sense = stream.expect_cmp()?;
                    let value = stream.expect_number()?;
                    apply_bound(model, var, sense, value);
                }
            }
            other => return stream.error(format!("unexpected token {:?} in bounds", other)),
        }
    }
    Ok(())
}

fn parse_integers(stream: &mut TokenStream, model: &mut Model, binary: bool) -> Result<()> {
    while !stream.is_eof() {
        let name = stream.expect_ident()?;
        let var = model.var_index(&name);
        let v = &mut model.variables[var];
        v.integer = true;
        if binary {
            v.lower = 0.0;
            v.upper = 1.0;
        }
    }
    Ok(())
}
