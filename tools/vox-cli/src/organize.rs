//! Organize command - rewrite wordlists grouped and sorted.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use vox_common::organize::organize_file;

/// Arguments for the organize command
#[derive(Args)]
pub struct OrganizeArgs {
    /// Wordlist files to rewrite in place
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the result here instead of rewriting in place
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also sort the section headers alphabetically
    #[arg(long)]
    pub sort_sections: bool,
}

/// Execute the organize command
pub fn execute(args: OrganizeArgs) -> Result<()> {
    if args.out.is_some() && args.files.len() > 1 {
        bail!("--out only works with a single input file");
    }
    for file in &args.files {
        let outcome = organize_file(file, args.out.as_deref(), args.sort_sections)?;
        for id in &outcome.dropped_duplicates {
            eprintln!("  warning: dropped duplicate entry '{id}'");
        }
        println!("Organized {}", outcome.written.display());
    }
    Ok(())
}
