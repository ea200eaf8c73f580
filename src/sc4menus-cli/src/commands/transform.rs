//! Transform command handler

use anyhow::{Context, Result};
use sc4menus::transform::transform;
use std::path::Path;

pub fn handle(src: &Path) -> Result<()> {
    let written = transform(src)
        .with_context(|| format!("Failed to scan {} for .sc4pac packages", src.display()))?;

    for path in &written {
        println!("Wrote {}", path.display());
    }
    if written.is_empty() {
        println!("No .sc4pac packages found under {}", src.display());
    }
    Ok(())
}
