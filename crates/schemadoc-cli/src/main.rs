//! schemadoc CLI
//!
//! Command-line interface for the example-to-documentation pipeline

use clap::{Parser, Subcommand};
use schemadoc_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "schemadoc")]
#[command(about = "schemadoc - Schema deltas for documentation examples", long_about = None)]
struct Cli {
    /// Logging profile: development or production (RUST_LOG overrides the filter)
    #[arg(long, global = true, default_value = "development")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build every example in a directory against a baseline schema
    Examples(commands::examples::ExamplesArgs),
    /// Print the delta between two schema documents
    Diff(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();
    init(cli.log);

    let result = match cli.command {
        Commands::Examples(args) => commands::examples::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
