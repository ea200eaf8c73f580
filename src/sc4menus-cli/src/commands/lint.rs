//! Lint command handler

use anyhow::{Context, Result};
use colored::Colorize;
use sc4menus::{lint_tree, LintLevel};
use std::path::Path;
use std::process;

pub fn handle(src: &Path) -> Result<()> {
    let report =
        lint_tree(src).with_context(|| format!("Failed to lint {}", src.display()))?;

    // Print everything before deciding the exit status.
    for entry in &report.entries {
        match entry.level {
            LintLevel::Error => eprintln!("{} {}", "error:".red().bold(), entry.message),
            LintLevel::Warning => eprintln!("{} {}", "warning:".yellow().bold(), entry.message),
        }
    }

    if report.has_errors() {
        process::exit(1);
    }
    println!("{}", "No naming issues found.".green());
    Ok(())
}
