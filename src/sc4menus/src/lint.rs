//! Folder naming convention checks.
//!
//! Menu folder names start with their Item Order as an 8-digit hex
//! token, e.g. `0x0a000001-beach-lots`. Orders in the top half of the
//! 32-bit range sort negatively in-game and must carry a leading
//! underscore so the filesystem keeps them visually apart:
//! `_0x8a000001-flora`.
//!
//! Findings accumulate in a [`LintReport`] instead of aborting; the CLI
//! prints every entry and only then decides the exit status.

use crate::traverse::{menu_folders, TraverseError};
use std::path::Path;

/// Orders at or above this value sort negatively in-game.
const NEGATIVE_ORDER_START: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintEntry {
    pub level: LintLevel,
    pub message: String,
}

/// Accumulated findings of one lint pass.
#[derive(Debug, Default)]
pub struct LintReport {
    pub entries: Vec<LintEntry>,
}

impl LintReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.entries.push(LintEntry {
            level: LintLevel::Error,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.entries.push(LintEntry {
            level: LintLevel::Warning,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.level == LintLevel::Error)
    }
}

/// Lint every menu folder under `root`. Traversal problems (missing or
/// malformed metadata) are still fatal; naming findings are collected.
pub fn lint_tree(root: &Path) -> Result<LintReport, TraverseError> {
    let mut report = LintReport::default();
    for folder in menu_folders(root)? {
        let basename = folder.dir.file_name().unwrap_or_default().to_string_lossy();
        let rel = folder.dir.strip_prefix(root).unwrap_or(&folder.dir);
        check_folder_name(&rel.to_string_lossy(), &basename, &mut report);
    }
    Ok(report)
}

/// Check one folder basename against the naming convention.
pub fn check_folder_name(rel: &str, basename: &str, report: &mut LintReport) {
    let token = basename
        .strip_prefix('_')
        .unwrap_or(basename)
        .split('-')
        .next()
        .unwrap_or("");

    if !starts_with_hex_order(token) {
        report.error(format!(
            "Folder {rel} must start with a valid 32-bit hexadecimal number."
        ));
        return;
    }
    // The sign rule only applies when the whole token is a numeral in
    // the negative 32-bit range; longer orders fall outside it.
    let order = token
        .strip_prefix("0x")
        .and_then(|digits| u64::from_str_radix(digits, 16).ok());
    if let Some(order) = order {
        if (u64::from(NEGATIVE_ORDER_START)..=u64::from(u32::MAX)).contains(&order)
            && !basename.starts_with('_')
        {
            report.error(format!(
                "Folder {rel} has a negative Item Order and must be prefixed with _"
            ));
        }
    }
}

/// Whether the token starts with `0x` followed by 8 hex digits.
fn starts_with_hex_order(token: &str) -> bool {
    token.strip_prefix("0x").is_some_and(|digits| {
        digits.len() >= 8 && digits.bytes().take(8).all(|b| b.is_ascii_hexdigit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn check(basename: &str) -> LintReport {
        let mut report = LintReport::default();
        check_folder_name(basename, basename, &mut report);
        report
    }

    #[test]
    fn test_valid_positive_order() {
        assert!(check("0x0a000001-foo").entries.is_empty());
    }

    #[test]
    fn test_negative_order_requires_underscore() {
        let report = check("0x8A000001-foo");
        assert_eq!(report.entries.len(), 1);
        assert!(report.has_errors());
        assert!(report.entries[0].message.contains("negative Item Order"));

        assert!(check("_0x8A000001-foo").entries.is_empty());
    }

    #[test]
    fn test_non_hex_token() {
        let report = check("zzzz-foo");
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].message.contains("hexadecimal"));
    }

    #[test]
    fn test_short_hex_token() {
        assert_eq!(check("0x8A01-foo").entries.len(), 1);
    }

    #[test]
    fn test_overlong_order_skips_sign_check() {
        // Ten hex digits are a valid token but no longer a 32-bit
        // order, so the underscore rule does not apply.
        assert!(check("0x8a00000100-foo").entries.is_empty());
        // Trailing non-hex noise likewise defeats the numeric parse.
        assert!(check("0x8a000001zz-foo").entries.is_empty());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = LintReport::default();
        report.warning("just a note");
        assert!(!report.has_errors());
    }

    #[test]
    fn test_lint_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("0x0a000001-good");
        let bad = tmp.path().join("0x8a000001-bad");
        for dir in [&good, &bad] {
            fs::create_dir_all(dir).unwrap();
            fs::write(dir.join("_menu.yaml"), "id: 1\nname: X").unwrap();
        }

        let report = lint_tree(tmp.path()).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].message.contains("0x8a000001-bad"));
    }
}
