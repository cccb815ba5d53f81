use crate::parser::ValidationIssue;
use crate::runner::types::{Outcome, TestSummary};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};
use std::time::Duration;

/// 控制台输出
pub struct TestReporter {
    verbose: bool,
}

impl TestReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// 打印测试开始
    pub fn print_header(&self, file_path: &str, suites: usize, requests: usize) {
        println!(
            "\nRunning {} requests in {} suites from {}...\n",
            requests,
            suites,
            file_path.bold()
        );
    }

    /// 单条结果的展示文本（不含换行）
    pub fn format_outcome(&self, outcome: &Outcome) -> String {
        let symbol = if outcome.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        let mut line = format!(
            " {} {} › {} › {}",
            symbol, outcome.suite, outcome.request, outcome.assertion
        );
        if let Some(error) = &outcome.error {
            line.push_str(&format!("\n     {}", error.red()));
        }
        line
    }

    /// 打印单条结果；非 verbose 模式下只打印失败
    pub fn print_outcome(&self, outcome: &Outcome) {
        if self.verbose || !outcome.passed {
            println!("{}", self.format_outcome(outcome));
        }
    }

    /// 按套件汇总的表格
    pub fn suite_table(&self, summary: &TestSummary) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Suite", "Requests", "Passed", "Failed"]);

        for suite in &summary.suites {
            let failed_color = if suite.failed == 0 {
                Color::Green
            } else {
                Color::Red
            };
            table.add_row(vec![
                Cell::new(&suite.name).add_attribute(Attribute::Bold),
                Cell::new(suite.requests),
                Cell::new(suite.passed).fg(Color::Green),
                Cell::new(suite.failed).fg(failed_color),
            ]);
        }
        table
    }

    /// 打印测试摘要
    pub fn print_summary(&self, summary: &TestSummary, elapsed: Duration) {
        println!("\n{}", "━".repeat(50));
        println!("{}", "Summary".bold());
        println!("{}", "━".repeat(50));

        if !summary.suites.is_empty() {
            println!("{}", self.suite_table(summary));
        }

        if summary.failed == 0 {
            println!(
                "  {}: {} passed, {} total",
                "Assertions".bold(),
                summary.passed.to_string().green(),
                summary.total
            );
        } else {
            println!(
                "  {}: {} passed, {} failed, {} total",
                "Assertions".bold(),
                summary.passed.to_string().green(),
                summary.failed.to_string().red(),
                summary.total
            );
        }
        println!(
            "  {}: {} with failures, {} total",
            "Requests".bold(),
            summary.failed_requests,
            summary.requests
        );
        println!("  {}: {:.3}s", "Duration".bold(), elapsed.as_secs_f64());
        println!();
    }

    /// 打印静态检查结果
    pub fn print_issues(&self, issues: &[ValidationIssue]) {
        if issues.is_empty() {
            println!("{} Suite file is valid.", "✓".green());
            return;
        }
        for issue in issues {
            println!(" {} {}", "✗".red(), issue);
        }
        println!(
            "\n{} {} validation issue(s) found.",
            "!".yellow(),
            issues.len()
        );
    }
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
