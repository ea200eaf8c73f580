//! Build command handler

use anyhow::{Context, Result};
use colored::Colorize;
use sc4menus::{build, BuildOptions, DbpfSynthesizer};
use std::path::Path;

pub fn handle(src: &Path, out: &Path) -> Result<()> {
    let options = BuildOptions {
        src: src.to_path_buf(),
        out: out.to_path_buf(),
    };
    let summary = build(&options, &DbpfSynthesizer)
        .with_context(|| format!("Failed to build {}", src.display()))?;

    for warning in &summary.warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
    println!(
        "Wrote {} button archive(s) and {} patch archive(s) to {}",
        summary.buttons,
        summary.patches,
        out.display()
    );
    Ok(())
}
