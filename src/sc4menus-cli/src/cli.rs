//! CLI argument definitions for sc4menus

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sc4menus")]
#[command(about = "SimCity 4 submenu plugin builder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build button and patch archives from the menu tree
    #[command(visible_alias = "b")]
    Build {
        /// Root of the menu definition tree
        #[arg(long, default_value = "src")]
        src: PathBuf,

        /// Distribution folder (recreated on every run)
        #[arg(long, default_value = "dist")]
        out: PathBuf,
    },

    /// Check folder naming conventions without writing output
    #[command(visible_alias = "l")]
    Lint {
        /// Root of the menu definition tree
        #[arg(long, default_value = "src")]
        src: PathBuf,
    },

    /// Regenerate .txt target lists from installed .sc4pac packages
    #[command(visible_alias = "t")]
    Transform {
        /// Root to scan for .sc4pac folders
        #[arg(long, default_value = "src")]
        src: PathBuf,
    },
}
