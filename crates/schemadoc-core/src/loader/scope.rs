//! Per-module evaluation scope.
//!
//! A scope holds exactly what a module may see while it is evaluated: its own
//! record, that record's exports, a `require` bound to the module's directory,
//! and the directory itself. Nothing else is reachable from a module.

use super::resolver::DependencyResolver;
use crate::errors::LoadError;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

const REQUIRE_TAG: &str = "require";
const EXPORTS_KEY: &str = "exports";

/// The record a module populates during evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    pub id: PathBuf,
    pub exports: Value,
}

impl ModuleRecord {
    fn new(id: &Path) -> Self {
        Self {
            id: id.to_path_buf(),
            exports: Value::Null,
        }
    }
}

/// `require` bound to one module's directory
pub struct ScopedRequire<'a> {
    resolver: &'a dyn DependencyResolver,
    from_dir: PathBuf,
    chain: &'a [PathBuf],
}

impl<'a> ScopedRequire<'a> {
    /// Evaluate the module `specifier` names in a fresh scope and return its exports.
    ///
    /// # Errors
    ///
    /// Resolution and read failures, `RequireCycle` when the module is already
    /// being evaluated further up the chain, and any error of the required
    /// module itself.
    pub fn require(&self, specifier: &str) -> Result<Value, LoadError> {
        let path = self.resolver.resolve(specifier, &self.from_dir)?;
        if self.chain.contains(&path) {
            let mut chain: Vec<String> = self
                .chain
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(LoadError::RequireCycle { chain });
        }
        tracing::debug!(specifier, path = %path.display(), "require");
        let source = self.resolver.read(&path)?;
        let record = evaluate_module(&source, &path, self.resolver, self.chain)?;
        Ok(record.exports)
    }

    pub fn from_dir(&self) -> &Path {
        &self.from_dir
    }
}

/// Isolated evaluation scope of a single module
pub struct ModuleScope<'a> {
    module: ModuleRecord,
    require: ScopedRequire<'a>,
    dirname: PathBuf,
}

impl<'a> ModuleScope<'a> {
    fn new(path: &Path, resolver: &'a dyn DependencyResolver, chain: &'a [PathBuf]) -> Self {
        let dirname = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            module: ModuleRecord::new(path),
            require: ScopedRequire {
                resolver,
                from_dir: dirname.clone(),
                chain,
            },
            dirname,
        }
    }

    pub fn module(&self) -> &ModuleRecord {
        &self.module
    }

    pub fn exports(&mut self) -> &mut Value {
        &mut self.module.exports
    }

    pub fn require(&self) -> &ScopedRequire<'a> {
        &self.require
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    fn evaluate(&self, value: Value) -> Result<Value, LoadError> {
        match value {
            Value::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                let tag = tag.trim_start_matches('!');
                if tag != REQUIRE_TAG {
                    return Err(LoadError::UnknownTag {
                        tag: tag.to_string(),
                        path: self.module.id.clone(),
                    });
                }
                match tagged.value {
                    Value::String(specifier) => self.require.require(&specifier),
                    _ => Err(LoadError::Parse {
                        path: self.module.id.clone(),
                        message: "!require expects a string specifier".to_string(),
                    }),
                }
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, value) in mapping {
                    out.insert(self.evaluate(key)?, self.evaluate(value)?);
                }
                Ok(Value::Mapping(out))
            }
            scalar => Ok(scalar),
        }
    }

    fn run(&mut self, document: Value) -> Result<(), LoadError> {
        let missing = |reason: &str| LoadError::MissingExports {
            path: self.module.id.clone(),
            reason: reason.to_string(),
        };
        let mut mapping = match self.evaluate(document)? {
            Value::Mapping(mapping) => mapping,
            _ => return Err(missing("module document is not a mapping")),
        };
        match mapping.remove(EXPORTS_KEY) {
            None | Some(Value::Null) => Err(missing("`exports` is missing or null")),
            Some(exports) => {
                self.module.exports = exports;
                Ok(())
            }
        }
    }

    fn into_record(self) -> ModuleRecord {
        self.module
    }
}

/// Evaluate one module in a fresh scope.
///
/// `parent_chain` lists the modules currently being evaluated, outermost first.
pub(crate) fn evaluate_module(
    source: &str,
    path: &Path,
    resolver: &dyn DependencyResolver,
    parent_chain: &[PathBuf],
) -> Result<ModuleRecord, LoadError> {
    let document: Value = serde_yaml::from_str(source).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut chain = parent_chain.to_vec();
    chain.push(path.to_path_buf());
    let mut scope = ModuleScope::new(path, resolver, &chain);
    scope.run(document)?;
    Ok(scope.into_record())
}
