use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the pipeline. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and the batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExErrorKind {
    // Module loading
    Load,
    ModuleNotFound,
    RequireCycle,
    MissingExports,

    // Schema assembly
    SchemaBuild,
    InvalidExtension,
    InvalidSchema,
    Conflict,
    NotFound,

    // Diff
    DiffInternal,
    DeterminismViolation,

    // Integration/IO
    Io,
    Serialization,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Load => "ERR_LOAD",
            ExErrorKind::ModuleNotFound => "ERR_MODULE_NOT_FOUND",
            ExErrorKind::RequireCycle => "ERR_REQUIRE_CYCLE",
            ExErrorKind::MissingExports => "ERR_MISSING_EXPORTS",
            ExErrorKind::SchemaBuild => "ERR_SCHEMA_BUILD",
            ExErrorKind::InvalidExtension => "ERR_INVALID_EXTENSION",
            ExErrorKind::InvalidSchema => "ERR_INVALID_SCHEMA",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::DiffInternal => "ERR_DIFF_INTERNAL",
            ExErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    example_id: Option<String>,
    path: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            example_id: None,
            path: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add example identifier context
    pub fn with_example(mut self, id: impl Into<String>) -> Self {
        self.example_id = Some(id.into());
        self
    }

    /// Add schema path or file path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the example identifier, if any
    pub fn example_id(&self) -> Option<&str> {
        self.example_id.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(example_id) = &self.example_id {
            write!(f, " (example: {})", example_id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

impl From<std::io::Error> for ExError {
    fn from(err: std::io::Error) -> Self {
        ExError::new(ExErrorKind::Io).with_message(err.to_string())
    }
}

// ========== End Error Facility ==========

/// Failures raised while evaluating an example module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Source file could not be read
    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// Source text is not a valid YAML document
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A `!require` specifier did not resolve to a module
    #[error("Cannot find module '{specifier}' from {}", .from.display())]
    ModuleNotFound { specifier: String, from: PathBuf },

    /// A resolved module lies outside the resolver's sandbox root
    #[error("Module '{specifier}' resolves outside the sandbox root {}", .root.display())]
    OutsideSandbox { specifier: String, root: PathBuf },

    /// A module requires itself, directly or transitively
    #[error("Require cycle detected: {}", .chain.join(" -> "))]
    RequireCycle { chain: Vec<String> },

    /// The source uses an expression tag the evaluator does not know
    #[error("Unknown tag '!{tag}' in {}", .path.display())]
    UnknownTag { tag: String, path: PathBuf },

    /// Evaluation finished without a usable `exports` value
    #[error("{} does not export a usable extension object: {reason}", .path.display())]
    MissingExports { path: PathBuf, reason: String },
}

impl From<LoadError> for ExError {
    fn from(err: LoadError) -> Self {
        let message = err.to_string();
        match err {
            LoadError::Read { path, .. } => ExError::new(ExErrorKind::Io)
                .with_op("load")
                .with_path(path.display().to_string())
                .with_message(message),
            LoadError::Parse { path, .. } | LoadError::UnknownTag { path, .. } => {
                ExError::new(ExErrorKind::Load)
                    .with_op("load")
                    .with_path(path.display().to_string())
                    .with_message(message)
            }
            LoadError::ModuleNotFound { from, .. } => ExError::new(ExErrorKind::ModuleNotFound)
                .with_op("require")
                .with_path(from.display().to_string())
                .with_message(message),
            LoadError::OutsideSandbox { root, .. } => ExError::new(ExErrorKind::ModuleNotFound)
                .with_op("require")
                .with_path(root.display().to_string())
                .with_message(message),
            LoadError::RequireCycle { .. } => ExError::new(ExErrorKind::RequireCycle)
                .with_op("require")
                .with_message(message),
            LoadError::MissingExports { path, .. } => ExError::new(ExErrorKind::MissingExports)
                .with_op("load")
                .with_path(path.display().to_string())
                .with_message(message),
        }
    }
}

/// Failures raised while assembling or validating a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Type already exists: {type_name}")]
    TypeAlreadyExists { type_name: String },

    #[error("Type not found: {type_name}")]
    TypeNotFound { type_name: String },

    #[error("Field already exists: {type_name}.{field}")]
    FieldAlreadyExists { type_name: String, field: String },

    #[error("Field not found: {type_name}.{field}")]
    FieldNotFound { type_name: String, field: String },

    #[error("Member {member} already declared on {type_name}")]
    MemberAlreadyExists { type_name: String, member: String },

    #[error("Directive @{directive} not applied to {target}")]
    DirectiveNotFound { target: String, directive: String },

    #[error("Directive @{directive} already applied to {target}")]
    DirectiveAlreadyApplied { target: String, directive: String },

    /// A type reference names a type that is neither defined nor built in
    #[error("{path} references unknown type {type_name}")]
    UnknownTypeReference { path: String, type_name: String },

    #[error("Invalid type reference '{type_ref}': {reason}")]
    InvalidTypeRef { type_ref: String, reason: String },

    /// A type, field, argument or member name is not an identifier
    #[error("Invalid name at {path}: names must match [_A-Za-z][_0-9A-Za-z]*")]
    InvalidName { path: String },

    #[error("Type {type_name} of kind {kind} cannot declare fields")]
    FieldsNotAllowed { type_name: String, kind: String },

    #[error("Type {type_name} of kind {kind} cannot declare members")]
    MembersNotAllowed { type_name: String, kind: String },

    #[error("Union {type_name} member {member} is not an object type")]
    InvalidUnionMember { type_name: String, member: String },

    /// The extension object does not match the extension contract
    #[error("Invalid extension: {reason}")]
    InvalidExtension { reason: String },

    /// A schema document could not be read or decoded
    #[error("Invalid schema document: {message}")]
    Document { message: String },
}

impl From<SchemaError> for ExError {
    fn from(err: SchemaError) -> Self {
        let message = err.to_string();
        match err {
            SchemaError::TypeAlreadyExists { type_name } => ExError::new(ExErrorKind::Conflict)
                .with_path(type_name)
                .with_message(message),
            SchemaError::FieldAlreadyExists { type_name, field } => {
                ExError::new(ExErrorKind::Conflict)
                    .with_path(format!("{}.{}", type_name, field))
                    .with_message(message)
            }
            SchemaError::MemberAlreadyExists { type_name, member } => {
                ExError::new(ExErrorKind::Conflict)
                    .with_path(format!("{}.{}", type_name, member))
                    .with_message(message)
            }
            SchemaError::DirectiveAlreadyApplied { target, directive } => {
                ExError::new(ExErrorKind::Conflict)
                    .with_path(format!("{}@{}", target, directive))
                    .with_message(message)
            }
            SchemaError::TypeNotFound { type_name } => ExError::new(ExErrorKind::NotFound)
                .with_path(type_name)
                .with_message(message),
            SchemaError::FieldNotFound { type_name, field } => ExError::new(ExErrorKind::NotFound)
                .with_path(format!("{}.{}", type_name, field))
                .with_message(message),
            SchemaError::DirectiveNotFound { target, directive } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_path(format!("{}@{}", target, directive))
                    .with_message(message)
            }
            SchemaError::UnknownTypeReference { path, .. } => {
                ExError::new(ExErrorKind::InvalidSchema)
                    .with_path(path)
                    .with_message(message)
            }
            SchemaError::InvalidName { path } => ExError::new(ExErrorKind::InvalidSchema)
                .with_path(path)
                .with_message(message),
            SchemaError::InvalidTypeRef { .. }
            | SchemaError::FieldsNotAllowed { .. }
            | SchemaError::MembersNotAllowed { .. }
            | SchemaError::InvalidUnionMember { .. } => {
                ExError::new(ExErrorKind::InvalidSchema).with_message(message)
            }
            SchemaError::InvalidExtension { .. } => {
                ExError::new(ExErrorKind::InvalidExtension).with_message(message)
            }
            SchemaError::Document { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Per-example failure, caught at the example boundary of a batch
///
/// Every variant carries the identifier of the example it belongs to so the
/// batch report can say which example failed and why.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExampleError {
    /// The example source failed to evaluate or export an extension
    #[error("Example '{example}' failed to load: {source}")]
    Load { example: String, source: LoadError },

    /// The extension conflicts with the baseline or malforms the schema
    #[error("Example '{example}' failed to build its schema: {source}")]
    SchemaBuild { example: String, source: SchemaError },

    /// The diff engine rejected its own output
    #[error("Example '{example}' produced an inconsistent diff: {message}")]
    DiffInternal { example: String, message: String },
}

impl ExampleError {
    /// Identifier of the failed example
    pub fn example(&self) -> &str {
        match self {
            ExampleError::Load { example, .. }
            | ExampleError::SchemaBuild { example, .. }
            | ExampleError::DiffInternal { example, .. } => example,
        }
    }

    /// Canonical kind of this failure
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ExampleError::Load { .. } => ExErrorKind::Load,
            ExampleError::SchemaBuild { .. } => ExErrorKind::SchemaBuild,
            ExampleError::DiffInternal { .. } => ExErrorKind::DiffInternal,
        }
    }
}

impl From<ExampleError> for ExError {
    fn from(err: ExampleError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            ExampleError::Load { example, source } => ExError::new(kind)
                .with_op("process_file")
                .with_example(example)
                .with_message(message)
                .with_source(source.into()),
            ExampleError::SchemaBuild { example, source } => ExError::new(kind)
                .with_op("process_file")
                .with_example(example)
                .with_message(message)
                .with_source(source.into()),
            ExampleError::DiffInternal { example, .. } => ExError::new(kind)
                .with_op("process_file")
                .with_example(example)
                .with_message(message),
        }
    }
}
