//! Example pipeline: load, assemble, diff, format.
//!
//! [`process_file`] handles a single example. [`process_batch`] runs many,
//! optionally in parallel, and turns per-example errors into failure records
//! so that one broken example never stops the others.

use crate::core_types::{RunContext, RunId};
use crate::diff::compute_diff;
use crate::errors::{ExError, ExErrorKind, ExampleError};
use crate::example::{discover_examples, ExampleModule};
use crate::formatter::{format_result, ExampleResult, Prettifier};
use crate::loader::DependencyResolver;
use crate::schema::{BuildOptions, DeclarativeExtension, SchemaFactory, SchemaSnapshot};
use crate::{log_op_end, log_op_error, log_op_start};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Note shown in place of a result when an example fails
pub const FAILURE_NOTE: &str = "This example failed to build";

/// External collaborators of the pipeline
#[derive(Clone)]
pub struct Services<'a> {
    pub prettify: &'a dyn Prettifier,
    /// Baseline every example is diffed against
    pub baseline: Arc<SchemaSnapshot>,
    pub schema_factory: &'a dyn SchemaFactory,
    pub resolver: &'a dyn DependencyResolver,
}

/// Batch run settings
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub parallel: bool,
    pub context: RunContext,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            context: RunContext::new(),
        }
    }
}

/// Failure record standing in for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleFailure {
    pub note: String,
    pub kind: ExErrorKind,
    pub code: String,
    pub message: String,
}

impl From<&ExampleError> for ExampleFailure {
    fn from(err: &ExampleError) -> Self {
        let kind = err.kind();
        Self {
            note: FAILURE_NOTE.to_string(),
            kind,
            code: kind.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExampleOutcome {
    Built(ExampleResult),
    Failed(ExampleFailure),
}

/// Outcome of one example in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleReport {
    pub id: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: ExampleOutcome,
}

impl ExampleReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExampleOutcome::Failed(_))
    }
}

/// Result of a batch run, in example path order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: RunId,
    pub baseline_digest: String,
    pub examples: Vec<ExampleReport>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = (&ExampleReport, &ExampleFailure)> {
        self.examples.iter().filter_map(|r| match &r.outcome {
            ExampleOutcome::Failed(f) => Some((r, f)),
            ExampleOutcome::Built(_) => None,
        })
    }

    pub fn built_count(&self) -> usize {
        self.examples.iter().filter(|r| !r.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.examples.iter().filter(|r| r.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Count line followed by one line per failed example.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} examples: {} built, {} failed\n",
            self.examples.len(),
            self.built_count(),
            self.failed_count()
        );
        for (report, failure) in self.failures() {
            out.push_str(&format!(
                "  {} [{}]: {}\n",
                report.id, failure.code, failure.message
            ));
        }
        out
    }
}

fn run_example(
    path: &Path,
    services: &Services<'_>,
) -> Result<(ExampleResult, usize), ExampleError> {
    let module = ExampleModule::load(path, services.resolver)?;
    let schema_error = |source| ExampleError::SchemaBuild {
        example: module.id.clone(),
        source,
    };

    let extension = DeclarativeExtension::from_object(&module.extension).map_err(schema_error)?;
    let options = BuildOptions::default().with_plugin(Arc::new(extension));
    let modified = services
        .schema_factory
        .build(&options)
        .map_err(schema_error)?;

    let diff = compute_diff(&services.baseline, &modified).map_err(|e| {
        ExampleError::DiffInternal {
            example: module.id.clone(),
            message: e.to_string(),
        }
    })?;

    let result = format_result(&module, &diff.entries, services.prettify);
    Ok((result, diff.entries.len()))
}

/// Process a single example file.
///
/// # Errors
///
/// `ExampleError` carrying the example title: `Load` when the source does not
/// evaluate, `SchemaBuild` when its extension cannot be applied, and
/// `DiffInternal` when the diff fails its own consistency check.
pub fn process_file(path: &Path, services: &Services<'_>) -> Result<ExampleResult, ExampleError> {
    let example_id = ExampleModule::id_for(path);
    log_op_start!("process_file", example_id = %example_id);
    let start = Instant::now();

    let result = run_example(path, services);
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok((_, entry_count)) => {
            log_op_end!(
                "process_file",
                duration_ms = duration_ms,
                example_id = %example_id,
                entry_count = *entry_count
            );
        }
        Err(err) => {
            log_op_error!(
                "process_file",
                err.clone(),
                duration_ms = duration_ms,
                example_id = %example_id
            );
        }
    }
    result.map(|(result, _)| result)
}

fn report_for(path: &Path, services: &Services<'_>, run_id: &RunId) -> ExampleReport {
    let _span = tracing::info_span!("example", run_id = %run_id).entered();
    let outcome = match process_file(path, services) {
        Ok(result) => ExampleOutcome::Built(result),
        Err(err) => {
            warn!("Example {} failed: {}", path.display(), err);
            ExampleOutcome::Failed(ExampleFailure::from(&err))
        }
    };
    ExampleReport {
        id: ExampleModule::id_for(path),
        path: path.to_path_buf(),
        outcome,
    }
}

/// Force the factory's baseline and check it is the one examples are diffed
/// against.
fn checked_baseline_digest(services: &Services<'_>) -> Result<String, ExError> {
    let built = services.schema_factory.baseline()?.digest()?;
    let diffed = services.baseline.digest()?;
    if built != diffed {
        return Err(ExError::new(ExErrorKind::Config).with_message(format!(
            "services baseline {} does not match schema factory baseline {}",
            diffed, built
        )));
    }
    Ok(built)
}

/// Process every example in `paths`.
///
/// The baseline is built before any example starts. Per-example failures are
/// recorded in the report.
///
/// # Errors
///
/// Only batch-level failures: the baseline cannot be built or digested, or
/// the factory's baseline differs from `services.baseline` (`Config`).
pub fn process_batch(
    paths: &[PathBuf],
    services: &Services<'_>,
    options: &BatchOptions,
) -> Result<BatchReport, ExError> {
    let run_id = &options.context.run_id;
    let label = options.context.label.as_deref().unwrap_or_default();
    log_op_start!(
        "process_batch",
        run_id = %run_id,
        label = label,
        example_count = paths.len(),
        parallel = options.parallel
    );
    let start = Instant::now();

    let baseline_digest = match checked_baseline_digest(services) {
        Ok(digest) => digest,
        Err(err) => {
            log_op_error!(
                "process_batch",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                run_id = %run_id
            );
            return Err(err.with_op("process_batch"));
        }
    };

    let mut ordered: Vec<&PathBuf> = paths.iter().collect();
    ordered.sort();

    let examples: Vec<ExampleReport> = if options.parallel {
        ordered
            .par_iter()
            .map(|path| report_for(path, services, run_id))
            .collect()
    } else {
        ordered
            .iter()
            .map(|path| report_for(path, services, run_id))
            .collect()
    };

    let report = BatchReport {
        run_id: run_id.clone(),
        baseline_digest,
        examples,
    };
    log_op_end!(
        "process_batch",
        duration_ms = start.elapsed().as_millis() as u64,
        run_id = %run_id,
        label = label,
        digest = %report.baseline_digest,
        built_count = report.built_count(),
        failed_count = report.failed_count()
    );
    Ok(report)
}

/// Discover the examples in `dir` and process them.
///
/// # Errors
///
/// An `Io` error when `dir` cannot be listed, then as [`process_batch`].
pub fn process_directory(
    dir: &Path,
    services: &Services<'_>,
    options: &BatchOptions,
) -> Result<BatchReport, ExError> {
    let paths = discover_examples(dir)?;
    process_batch(&paths, services, options)
}
