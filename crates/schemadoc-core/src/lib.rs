//! schemadoc core - example-to-documentation schema delta pipeline
//!
//! For every example module the pipeline:
//! - evaluates the module in an isolated scope to obtain its extension
//! - applies the extension to a private copy of the shared baseline schema
//! - diffs the baseline against the extended schema
//! - formats the source and the delta into an [`ExampleResult`]
//!
//! Batches run examples independently, in parallel when asked to, and record
//! per-example failures instead of aborting.

pub mod diff;
pub mod errors;
pub mod example;
pub mod formatter;
pub mod loader;
pub mod logging_facility;
pub mod pipeline;
pub mod schema;

pub use schemadoc_core_types as core_types;

// Re-export commonly used types
pub use diff::{compute_diff, diff_snapshots, render_text, DiffEntry, DiffKind, SchemaDiff};
pub use errors::{ExError, ExErrorKind, ExampleError, LoadError, Result, SchemaError};
pub use example::{discover_examples, file_filter, filename_to_example_title, ExampleModule};
pub use formatter::{
    format_result, ExampleResult, Prettifier, WhitespacePrettifier, EXAMPLE_LANGUAGE,
    RESULT_LANGUAGE,
};
pub use loader::{DependencyResolver, ExtensionObject, FsResolver, MemoryResolver, ModuleLoader};
pub use pipeline::{
    process_batch, process_directory, process_file, BatchOptions, BatchReport, ExampleFailure,
    ExampleOutcome, ExampleReport, Services,
};
pub use schema::{
    SchemaAssembler, SchemaBuilder, SchemaDocument, SchemaExtension, SchemaFactory,
    SchemaSnapshot,
};
