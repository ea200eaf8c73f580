mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { src, out } => {
            commands::build::handle(&src, &out)?;
        }

        Commands::Lint { src } => {
            commands::lint::handle(&src)?;
        }

        Commands::Transform { src } => {
            commands::transform::handle(&src)?;
        }
    }

    Ok(())
}
