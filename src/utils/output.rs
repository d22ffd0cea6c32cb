//! # 美化输出工具
//!
//! 统一的终端输出样式：状态前缀、标题栏、文本块。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;

const RULE_WIDTH: usize = 60;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印求解状态，不可行类状态标红
pub fn print_status(name: &str, code: u8, alarming: bool) {
    let label = if alarming {
        name.red().bold()
    } else {
        name.green().bold()
    };
    println!("{} Status: {} ({})", "[*]".blue().bold(), label, code);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(RULE_WIDTH);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印带标题的原样文本块
pub fn print_block(title: &str, body: &str) {
    print_header(title);
    println!("{}", body.trim_end());
    print_separator();
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}
