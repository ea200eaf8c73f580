//! Seed target lists from downloaded `.sc4pac` packages.
//!
//! Package folders installed by sc4pac are named `<group>.<name>.sc4pac`
//! and contain the upstream `.dat` files. This pass scans each such
//! folder for lot configuration exemplars and writes a sibling
//! `<group>.<name>.txt` target list, one sorted `group, instance` line
//! per lot, ready for hand-editing into the menu tree.
//!
//! QFS-compressed records cannot be decoded in-crate and are skipped;
//! hand-checking the generated list is expected anyway.

use crate::dbpf::{Package, TYPE_EXEMPLAR};
use crate::exemplar::{prop, Exemplar, EXEMPLAR_TYPE_LOT_CONFIG};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Folder extension marking an installed package.
pub const PACKAGE_EXTENSION: &str = "sc4pac";

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Scan `root` for `.sc4pac` folders and write one target list next to
/// each. Returns the paths of the written lists.
pub fn transform(root: &Path) -> Result<Vec<PathBuf>, TransformError> {
    let mut written = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() || !has_package_extension(entry.path()) {
            continue;
        }

        let lines = scan_package_dir(entry.path())?;
        let output = list_path(entry.path());
        fs::write(&output, lines.join(""))?;
        written.push(output);
    }

    Ok(written)
}

/// Collect the sorted target lines of one package folder.
fn scan_package_dir(dir: &Path) -> Result<Vec<String>, TransformError> {
    let mut lines = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_dat = entry.path().extension().and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("dat"));
        if !entry.file_type().is_file() || !is_dat {
            continue;
        }

        let bytes = fs::read(entry.path())?;
        // Anything that is not a readable DBPF archive is skipped,
        // package folders carry documentation files too.
        let Ok(package) = Package::parse(&bytes) else {
            continue;
        };
        for record in package.records_of_type(TYPE_EXEMPLAR) {
            // Compressed or exotic records fail to parse; skip them.
            let Ok(exemplar) = Exemplar::parse(&record.data) else {
                continue;
            };
            if exemplar.uint32(prop::EXEMPLAR_TYPE) != Some(EXEMPLAR_TYPE_LOT_CONFIG) {
                continue;
            }
            let mut line = format!("0x{:08x}, 0x{:08x}", record.tgi.group, record.tgi.instance);
            if let Some(name) = exemplar.string(prop::EXEMPLAR_NAME) {
                line.push_str(&format!(" # {name}"));
            }
            line.push('\n');
            lines.push(line);
        }
    }

    lines.sort();
    lines.dedup();
    Ok(lines)
}

fn has_package_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// `memo.industrial-revolution-mod.sc4pac` writes next to itself as
/// `memo.industrial-revolution-mod.txt`.
fn list_path(dir: &Path) -> PathBuf {
    let stem = dir
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .trim_end_matches(&format!(".{PACKAGE_EXTENSION}"))
        .to_string();
    dir.parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{stem}.txt"))
}
