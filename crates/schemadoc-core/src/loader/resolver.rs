//! Dependency resolution for `!require`.

use crate::errors::LoadError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Locates and reads the modules an example requires
pub trait DependencyResolver: Send + Sync {
    /// Resolve `specifier` relative to the requiring module's directory.
    ///
    /// # Errors
    ///
    /// `ModuleNotFound` when nothing matches, `OutsideSandbox` when the match
    /// is outside the permitted root.
    fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, LoadError>;

    /// Read a resolved module's source text.
    ///
    /// # Errors
    ///
    /// `LoadError::Read` when the source cannot be read.
    fn read(&self, path: &Path) -> Result<String, LoadError>;
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Filesystem resolver, optionally confined to a root directory
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    root: Option<PathBuf>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any module that resolves outside `root`.
    ///
    /// # Errors
    ///
    /// `LoadError::Read` when the root cannot be canonicalized.
    pub fn sandboxed(root: &Path) -> Result<Self, LoadError> {
        let root = root.canonicalize().map_err(|e| LoadError::Read {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { root: Some(root) })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl DependencyResolver for FsResolver {
    fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, LoadError> {
        let not_found = || LoadError::ModuleNotFound {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        };
        if !is_relative_specifier(specifier) {
            return Err(not_found());
        }
        let resolved = from_dir
            .join(specifier)
            .canonicalize()
            .map_err(|_| not_found())?;
        if let Some(root) = &self.root {
            if !resolved.starts_with(root) {
                return Err(LoadError::OutsideSandbox {
                    specifier: specifier.to_string(),
                    root: root.clone(),
                });
            }
        }
        if !resolved.is_file() {
            return Err(not_found());
        }
        Ok(resolved)
    }

    fn read(&self, path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Resolver over an in-memory set of files, keyed by absolute path
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.files.insert(normalize(&path.into()), source.into());
        self
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl DependencyResolver for MemoryResolver {
    fn resolve(&self, specifier: &str, from_dir: &Path) -> Result<PathBuf, LoadError> {
        let candidate = normalize(&from_dir.join(specifier));
        if is_relative_specifier(specifier) && self.files.contains_key(&candidate) {
            Ok(candidate)
        } else {
            Err(LoadError::ModuleNotFound {
                specifier: specifier.to_string(),
                from: from_dir.to_path_buf(),
            })
        }
    }

    fn read(&self, path: &Path) -> Result<String, LoadError> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::Read {
                path: path.to_path_buf(),
                message: "no such file".to_string(),
            })
    }
}
