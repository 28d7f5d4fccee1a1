//! Diff command
//!
//! Usage: schemadoc diff <BEFORE> <AFTER> [--summary]

use clap::Args;
use schemadoc_core::diff::{compute_diff, render_summary, render_text};
use schemadoc_core::{SchemaBuilder, SchemaDocument};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Schema document before the change
    pub before: PathBuf,

    /// Schema document after the change
    pub after: PathBuf,

    /// Print a review summary instead of the bare delta
    #[arg(long)]
    pub summary: bool,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let before = SchemaBuilder::from_document(SchemaDocument::from_file(&args.before)?).finish()?;
    let after = SchemaBuilder::from_document(SchemaDocument::from_file(&args.after)?).finish()?;

    let diff = compute_diff(&before, &after)?;
    if args.summary {
        print!("{}", render_summary(&diff));
    } else {
        print!("{}", render_text(&diff.entries));
    }
    Ok(())
}
