//! # sc4menus
//!
//! SimCity 4 submenu plugin build library.
//!
//! This library turns a human-authored directory tree of menu definitions
//! (YAML metadata, icon images, plain-text patch target lists) into binary
//! DBPF archives containing the Cohort/Exemplar records SimCity 4 loads as
//! plugins. It provides functionality to:
//! - Walk a source tree and resolve menu folders and their parent menus
//! - Parse and merge patch target lists across files
//! - Synthesize submenu button and exemplar patch records
//! - Write deterministic `.dat` packages to a distribution folder
//! - Lint folder naming conventions without producing output
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use sc4menus::{build, BuildOptions, DbpfSynthesizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BuildOptions {
//!     src: PathBuf::from("src"),
//!     out: PathBuf::from("dist"),
//! };
//! let summary = build(&options, &DbpfSynthesizer)?;
//! println!("{} buttons, {} patches", summary.buttons, summary.patches);
//! # Ok(())
//! # }
//! ```

pub mod builtins;
pub mod dbpf;
pub mod exemplar;
pub mod lint;
pub mod menu;
pub mod pipeline;
pub mod synth;
pub mod targets;
pub mod transform;
pub mod traverse;

// Re-export commonly used items
#[doc(inline)]
pub use builtins::{builtin_name, is_builtin};
#[doc(inline)]
pub use dbpf::{DbpfError, Package, Record, Tgi};
#[doc(inline)]
pub use lint::{lint_tree, LintEntry, LintLevel, LintReport};
#[doc(inline)]
pub use menu::{slugify, MenuDescriptor, MenuId};
#[doc(inline)]
pub use pipeline::{build, BuildError, BuildOptions, BuildSummary};
#[doc(inline)]
pub use synth::{ButtonSpec, DbpfSynthesizer, PatchSpec, SynthError, Synthesizer};
#[doc(inline)]
pub use targets::{parse_targets, ParseError, TargetCategory, TargetDatabase, TargetId};
#[doc(inline)]
pub use traverse::{menu_folders, MenuFolder, TraverseError};
