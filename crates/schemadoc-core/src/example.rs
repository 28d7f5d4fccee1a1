//! Example discovery and per-example modules.

use crate::errors::{ExError, ExErrorKind, ExampleError};
use crate::loader::{DependencyResolver, ExtensionObject, ModuleLoader};
use std::path::{Path, PathBuf};

const EXAMPLE_EXTENSIONS: &[&str] = &[".yaml", ".yml"];
const PLUGIN_SUFFIX: &str = "Plugin";

/// Whether a directory entry name is an example source.
pub fn file_filter(name: &str) -> bool {
    !name.starts_with('.') && EXAMPLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Title shown for an example file.
///
/// Strips a trailing lowercase extension and, only when one was stripped, a
/// `Plugin` suffix before it: `myFeaturePlugin.yaml` becomes `myFeature`.
pub fn filename_to_example_title(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot)
            if dot + 1 < file_name.len()
                && file_name[dot + 1..].bytes().all(|b| b.is_ascii_lowercase()) =>
        {
            &file_name[..dot]
        }
        _ => return file_name.to_string(),
    };
    stem.strip_suffix(PLUGIN_SUFFIX).unwrap_or(stem).to_string()
}

/// List the example files of `dir`, sorted by path. Symlinks are followed.
///
/// # Errors
///
/// Returns an `Io` error when the directory cannot be listed.
pub fn discover_examples(dir: &Path) -> Result<Vec<PathBuf>, ExError> {
    let io_error = |e: std::io::Error| {
        ExError::new(ExErrorKind::Io)
            .with_op("discover_examples")
            .with_path(dir.display().to_string())
            .with_message(e.to_string())
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if file_filter(name) && entry.path().is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// One loaded example, discarded once its result is formatted
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleModule {
    pub id: String,
    pub path: PathBuf,
    pub source: String,
    pub extension: ExtensionObject,
}

impl ExampleModule {
    /// Title for the example at `path`.
    pub fn id_for(path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        filename_to_example_title(&file_name)
    }

    /// Read and evaluate the example at `path`.
    ///
    /// # Errors
    ///
    /// `ExampleError::Load` carrying the example title.
    pub fn load(path: &Path, resolver: &dyn DependencyResolver) -> Result<Self, ExampleError> {
        let id = Self::id_for(path);
        let wrap = |source| ExampleError::Load {
            example: id.clone(),
            source,
        };
        let source = resolver.read(path).map_err(wrap)?;
        let extension = ModuleLoader::new(resolver)
            .load(&source, path)
            .map_err(wrap)?;
        Ok(Self {
            id,
            path: path.to_path_buf(),
            source,
            extension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryResolver;

    #[test]
    fn test_file_filter() {
        assert!(file_filter("addPongPlugin.yaml"));
        assert!(file_filter("addPong.yml"));
        assert!(!file_filter(".hidden.yaml"));
        assert!(!file_filter("README.md"));
        assert!(!file_filter("addPong.yaml.bak"));
    }

    #[test]
    fn test_filename_to_example_title() {
        assert_eq!(filename_to_example_title("myFeaturePlugin.yaml"), "myFeature");
        assert_eq!(filename_to_example_title("myFeature.yaml"), "myFeature");
        assert_eq!(filename_to_example_title("Plugin.yml"), "");
        assert_eq!(filename_to_example_title("archive.tar.yaml"), "archive.tar");
        // Uppercase extensions and missing extensions are left alone, suffix included.
        assert_eq!(filename_to_example_title("myPlugin.YAML"), "myPlugin.YAML");
        assert_eq!(filename_to_example_title("myPlugin"), "myPlugin");
    }

    #[test]
    fn test_discover_examples_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yml", ".hidden.yaml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "exports: {}\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.yaml")).unwrap();

        let found = discover_examples(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinked_examples() {
        let shared = tempfile::tempdir().unwrap();
        let target = shared.path().join("shared.yaml");
        std::fs::write(&target, "exports: {}\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("linkedPlugin.yaml")).unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("linkedDir.yaml")).unwrap();

        let found = discover_examples(dir.path()).unwrap();
        assert_eq!(found, vec![dir.path().join("linkedPlugin.yaml")]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = discover_examples(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
    }

    #[test]
    fn test_example_load_error_carries_title() {
        let resolver = MemoryResolver::new().with_file("/ex/brokenPlugin.yaml", "hooks: []\n");
        let err = ExampleModule::load(Path::new("/ex/brokenPlugin.yaml"), &resolver).unwrap_err();
        assert_eq!(err.example(), "broken");
        assert!(matches!(err, ExampleError::Load { .. }));
    }
}
