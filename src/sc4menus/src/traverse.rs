//! Source tree traversal.
//!
//! A menu folder is any directory in the source tree containing at least
//! one regular file. Qualifying folders must carry a `_menu.yaml`
//! metadata file; directories with no files at all are organizational
//! and skipped. The parent menu is resolved from the metadata file of
//! the immediate parent directory, which may legitimately be absent
//! (top-level folders hang under builtin menus).

use crate::menu::MenuDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name of the per-folder menu metadata.
pub const MENU_METADATA_FILE: &str = "_menu.yaml";

#[derive(Error, Debug)]
pub enum TraverseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("no _menu.yaml file found in {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("invalid menu metadata in {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// One discovered menu folder. Immutable after discovery.
#[derive(Debug, Clone)]
pub struct MenuFolder {
    /// Absolute (or root-relative) path of the folder.
    pub dir: PathBuf,

    /// Parsed `_menu.yaml` of this folder.
    pub menu: MenuDescriptor,

    /// Parsed `_menu.yaml` of the immediate parent directory, if present.
    pub parent: Option<MenuDescriptor>,

    /// First `.png` file in the folder, if any.
    pub icon: Option<PathBuf>,

    /// Remaining data files (patch target lists), sorted by name.
    pub files: Vec<PathBuf>,
}

/// Discover all menu folders under `root`, in sorted filesystem order.
pub fn menu_folders(root: &Path) -> Result<Vec<MenuFolder>, TraverseError> {
    let mut folders = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        // Collect the regular files in this directory; a folder with no
        // files is organizational only and does not define a menu.
        let mut names = Vec::new();
        for child in fs::read_dir(entry.path())? {
            let child = child?;
            if child.file_type()?.is_file() {
                names.push(child.file_name().to_string_lossy().into_owned());
            }
        }
        if names.is_empty() {
            continue;
        }
        names.sort();

        if !names.iter().any(|n| n == MENU_METADATA_FILE) {
            return Err(TraverseError::MissingMetadata(entry.path().to_path_buf()));
        }
        let menu = read_descriptor(&entry.path().join(MENU_METADATA_FILE))?;
        let parent = parent_descriptor(entry.path())?;

        let mut icon = None;
        let mut files = Vec::new();
        for name in names {
            if name == MENU_METADATA_FILE {
                continue;
            }
            let path = entry.path().join(&name);
            if has_extension(&name, "png") {
                // First icon wins; further images are ignored.
                if icon.is_none() {
                    icon = Some(path);
                }
            } else {
                files.push(path);
            }
        }

        folders.push(MenuFolder {
            dir: entry.path().to_path_buf(),
            menu,
            parent,
            icon,
            files,
        });
    }

    Ok(folders)
}

/// Read and parse a `_menu.yaml` file.
fn read_descriptor(path: &Path) -> Result<MenuDescriptor, TraverseError> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|source| TraverseError::Metadata {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the parent directory's metadata, tolerating its absence.
fn parent_descriptor(dir: &Path) -> Result<Option<MenuDescriptor>, TraverseError> {
    let Some(parent_dir) = dir.parent() else {
        return Ok(None);
    };
    let path = parent_dir.join(MENU_METADATA_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => serde_yaml::from_str(&contents)
            .map(Some)
            .map_err(|source| TraverseError::Metadata { path, source }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
