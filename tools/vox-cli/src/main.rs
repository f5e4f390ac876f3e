//! vox - build tool for VOX announcement libraries
//!
//! # Commands
//!
//! - `vox build` - Produce every clip the wordlists describe (main command)
//! - `vox organize` - Rewrite wordlists sorted and grouped by section
//! - `vox sing` - Render the built-in multi-voice test track
//!
//! # Usage
//!
//! In a project directory with vox.toml:
//! ```bash
//! # Full build: synthesize, process, encode, emit manifest + game code
//! vox build
//!
//! # Rebuild everything from scratch
//! vox build --force
//!
//! # Tidy a wordlist in place
//! vox organize wordlists/announcements.txt
//! ```
//!
//! # Configuration (vox.toml)
//!
//! ```toml
//! codebase_target = "vg"
//! wordlists = ["wordlists/announcements.txt"]
//!
//! [voices]
//! female = "us-clb"
//! male = "us-rms"
//!
//! # Optional per-entry tweaks
//! [overrides.klaxon]
//! flags = ["pre-mastered"]
//! ```

mod build;
mod organize;
mod pipeline;
mod sing;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// vox - build tool for VOX announcement libraries
#[derive(Parser)]
#[command(name = "vox")]
#[command(about = "Build tool for VOX announcement libraries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce every clip the wordlists describe (main command)
    Build(build::BuildArgs),

    /// Rewrite wordlists sorted and grouped by section
    Organize(organize::OrganizeArgs),

    /// Render the built-in multi-voice test track
    Sing(sing::SingArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build::execute(args),
        Commands::Organize(args) => organize::execute(args),
        Commands::Sing(args) => sing::execute(args),
    }
}
