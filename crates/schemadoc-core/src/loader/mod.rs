//! Module loader for example sources.
//!
//! An example is a YAML module. Evaluating it resolves every `!require` tag
//! against the example's own directory and returns the module's `exports`
//! mapping as an [`ExtensionObject`]. Each load starts from an empty scope and
//! caches nothing, so one example can never observe another.

pub mod resolver;
pub mod scope;

pub use resolver::{DependencyResolver, FsResolver, MemoryResolver};
pub use scope::{ModuleRecord, ModuleScope, ScopedRequire};

use crate::errors::LoadError;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// The value an example module exports
///
/// Opaque to the loader: whether it is a valid extension is decided when the
/// schema assembler converts it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionObject {
    value: Value,
    path: PathBuf,
}

impl ExtensionObject {
    pub fn new(value: Value, path: PathBuf) -> Self {
        Self { value, path }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Path of the module that exported this object
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Evaluates example modules through a [`DependencyResolver`]
pub struct ModuleLoader<'r> {
    resolver: &'r dyn DependencyResolver,
}

impl<'r> ModuleLoader<'r> {
    pub fn new(resolver: &'r dyn DependencyResolver) -> Self {
        Self { resolver }
    }

    /// Evaluate `source` as the module at `path`.
    ///
    /// # Errors
    ///
    /// Any `LoadError` raised during evaluation, or `MissingExports` when the
    /// module does not export a mapping.
    pub fn load(&self, source: &str, path: &Path) -> Result<ExtensionObject, LoadError> {
        let record = scope::evaluate_module(source, path, self.resolver, &[])?;
        match record.exports {
            Value::Mapping(_) => Ok(ExtensionObject::new(record.exports, record.id)),
            _ => Err(LoadError::MissingExports {
                path: record.id,
                reason: "`exports` is not a mapping".to_string(),
            }),
        }
    }

    /// Read and evaluate the module at `path`.
    ///
    /// # Errors
    ///
    /// `LoadError::Read` when the file cannot be read, then as [`Self::load`].
    pub fn load_file(&self, path: &Path) -> Result<ExtensionObject, LoadError> {
        let source = self.resolver.read(path)?;
        self.load(&source, path)
    }
}
