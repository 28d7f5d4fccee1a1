//! Examples command
//!
//! Usage: schemadoc examples --baseline <SCHEMA> --dir <DIR> [--format json|text]

use super::config::{OutputFormat, RunConfig};
use clap::Args;
use schemadoc_core::core_types::RunContext;
use schemadoc_core::{
    process_directory, BatchOptions, BatchReport, ExampleOutcome, FsResolver, SchemaAssembler,
    SchemaDocument, SchemaFactory, Services, WhitespacePrettifier,
};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExamplesArgs {
    /// Baseline schema document (YAML or JSON)
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Directory containing the example modules
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Process examples one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Exit with an error if any example fails to build
    #[arg(long)]
    pub strict: bool,

    /// Run configuration file; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Flags merged over the configuration file
#[derive(Debug)]
struct Settings {
    baseline: PathBuf,
    dir: PathBuf,
    format: OutputFormat,
    parallel: bool,
    strict: bool,
}

impl Settings {
    fn resolve(args: ExamplesArgs, config: RunConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let baseline = args
            .baseline
            .or(config.baseline)
            .ok_or("Must specify --baseline or `baseline` in the config file")?;
        let dir = args
            .dir
            .or(config.examples_dir)
            .ok_or("Must specify --dir or `examples_dir` in the config file")?;
        Ok(Self {
            baseline,
            dir,
            format: args.format.or(config.format).unwrap_or_default(),
            parallel: !args.sequential && config.parallel.unwrap_or(true),
            strict: args.strict || config.strict.unwrap_or(false),
        })
    }
}

pub fn execute(args: ExamplesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    let settings = Settings::resolve(args, config)?;

    let assembler = SchemaAssembler::from_document(SchemaDocument::from_file(&settings.baseline)?);
    let baseline = assembler.baseline()?;
    let resolver = FsResolver::sandboxed(&settings.dir)?;
    let services = Services {
        prettify: &WhitespacePrettifier,
        baseline,
        schema_factory: &assembler,
        resolver: &resolver,
    };
    let options = BatchOptions {
        parallel: settings.parallel,
        context: RunContext::new().with_label(settings.dir.display().to_string()),
    };

    let report = process_directory(&settings.dir, &services, &options)?;

    match settings.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.examples)?);
            eprint!("{}", report.summary());
        }
        OutputFormat::Text => print!("{}", render_report(&report)),
    }

    if settings.strict && report.has_failures() {
        return Err(format!("{} example(s) failed to build", report.failed_count()).into());
    }
    Ok(())
}

fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for example in &report.examples {
        out.push_str(&format!("## {}\n\n", example.id));
        match &example.outcome {
            ExampleOutcome::Built(result) => {
                out.push_str(&format!(
                    "```{}\n{}```\n\n",
                    result.example_language, result.example
                ));
                if result.result.is_empty() {
                    out.push_str("_No schema changes._\n\n");
                } else {
                    out.push_str(&format!(
                        "```{}\n{}```\n\n",
                        result.result_language, result.result
                    ));
                }
            }
            ExampleOutcome::Failed(failure) => {
                out.push_str(&format!(
                    "> {} ({}): {}\n\n",
                    failure.note, failure.code, failure.message
                ));
            }
        }
    }
    out.push_str(&report.summary());
    out
}
