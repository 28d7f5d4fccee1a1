use schemadoc_core::{
    BatchOptions, FsResolver, SchemaAssembler, SchemaDocument, SchemaFactory, SchemaSnapshot,
    Services, WhitespacePrettifier,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Baseline used by most scenarios: `Query { ping: String }`
#[allow(dead_code)]
pub const PING_BASELINE: &str = r#"
types:
  Query:
    kind: object
    fields:
      ping: String
"#;

/// Example adding `Query.pong: String`
#[allow(dead_code)]
pub const ADD_PONG: &str = r#"
exports:
  hooks:
    - extend_type:
        Query:
          fields:
            pong: String
"#;

/// Example adding `Query.health: Boolean`
#[allow(dead_code)]
pub const ADD_HEALTH: &str = r#"
exports:
  hooks:
    - extend_type:
        Query:
          fields:
            health: Boolean
"#;

/// Example changing `Query.ping` from `String` to `Int`
#[allow(dead_code)]
pub const RETYPE_PING: &str = r#"
exports:
  hooks:
    - replace_field:
        on: Query
        name: ping
        field: Int
"#;

#[allow(dead_code)]
pub fn assembler(baseline_yaml: &str) -> SchemaAssembler {
    SchemaAssembler::from_document(SchemaDocument::from_yaml_str(baseline_yaml).unwrap())
}

/// Write `files` into a fresh temporary directory.
#[allow(dead_code)]
pub fn example_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
    dir
}

/// Owns everything `Services` borrows.
#[allow(dead_code)]
pub struct Harness {
    pub assembler: SchemaAssembler,
    pub resolver: FsResolver,
    pub prettifier: WhitespacePrettifier,
    pub baseline: Arc<SchemaSnapshot>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(baseline_yaml: &str, root: &Path) -> Self {
        let assembler = assembler(baseline_yaml);
        let baseline = assembler.baseline().unwrap();
        Self {
            assembler,
            resolver: FsResolver::sandboxed(root).unwrap(),
            prettifier: WhitespacePrettifier,
            baseline,
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            prettify: &self.prettifier,
            baseline: Arc::clone(&self.baseline),
            schema_factory: &self.assembler,
            resolver: &self.resolver,
        }
    }
}

#[allow(dead_code)]
pub fn sequential() -> BatchOptions {
    BatchOptions {
        parallel: false,
        ..BatchOptions::default()
    }
}

#[allow(dead_code)]
pub fn path_in(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
