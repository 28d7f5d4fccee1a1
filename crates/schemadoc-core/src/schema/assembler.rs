//! Schema assembly.
//!
//! The baseline is built once and shared as an `Arc`. Every extended build
//! starts from a private copy of it, so extensions applied for one example
//! are never visible to the next.

use super::builder::SchemaBuilder;
use super::extension::SchemaExtension;
use super::model::{SchemaDocument, SchemaSnapshot};
use crate::errors::SchemaError;
use crate::{log_op_end, log_op_error, log_op_start};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Options for a single extended build
#[derive(Default, Clone)]
pub struct BuildOptions {
    /// Extensions applied in order after the baseline
    pub append_plugins: Vec<Arc<dyn SchemaExtension>>,
}

impl BuildOptions {
    pub fn with_plugin(mut self, plugin: Arc<dyn SchemaExtension>) -> Self {
        self.append_plugins.push(plugin);
        self
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.append_plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("BuildOptions")
            .field("append_plugins", &names)
            .finish()
    }
}

/// Produces the baseline schema and extended variants of it
pub trait SchemaFactory: Send + Sync {
    /// The shared baseline, built at most once.
    ///
    /// # Errors
    ///
    /// Returns the error raised while building the baseline.
    fn baseline(&self) -> Result<Arc<SchemaSnapshot>, SchemaError>;

    /// A fresh schema: the baseline plus `options.append_plugins`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an extension or by validation.
    fn build(&self, options: &BuildOptions) -> Result<SchemaSnapshot, SchemaError>;
}

type BaselineFn = dyn Fn() -> Result<SchemaSnapshot, SchemaError> + Send + Sync;

/// Default [`SchemaFactory`] with a memoized baseline
pub struct SchemaAssembler {
    build_baseline: Box<BaselineFn>,
    baseline: OnceLock<Arc<SchemaSnapshot>>,
}

impl SchemaAssembler {
    pub fn new<F>(build_baseline: F) -> Self
    where
        F: Fn() -> Result<SchemaSnapshot, SchemaError> + Send + Sync + 'static,
    {
        Self {
            build_baseline: Box::new(build_baseline),
            baseline: OnceLock::new(),
        }
    }

    /// Assembler whose baseline is an already-built snapshot.
    pub fn from_snapshot(snapshot: SchemaSnapshot) -> Self {
        let baseline = Arc::new(snapshot);
        Self {
            baseline: OnceLock::from(Arc::clone(&baseline)),
            build_baseline: Box::new(move || Ok((*baseline).clone())),
        }
    }

    /// Assembler whose baseline is validated from `document` on first use.
    pub fn from_document(document: SchemaDocument) -> Self {
        Self::new(move || SchemaBuilder::from_document(document.clone()).finish())
    }

    /// Force the baseline build.
    ///
    /// # Errors
    ///
    /// Returns the baseline build error.
    pub fn build_baseline(&self) -> Result<Arc<SchemaSnapshot>, SchemaError> {
        if let Some(baseline) = self.baseline.get() {
            return Ok(Arc::clone(baseline));
        }
        log_op_start!("build_baseline");
        let start = Instant::now();
        match (self.build_baseline)() {
            Ok(snapshot) => {
                // A concurrent caller may have won the race; keep whichever landed first.
                let baseline = Arc::clone(self.baseline.get_or_init(|| Arc::new(snapshot)));
                log_op_end!(
                    "build_baseline",
                    duration_ms = start.elapsed().as_millis() as u64,
                    type_count = baseline.len()
                );
                Ok(baseline)
            }
            Err(err) => {
                log_op_error!(
                    "build_baseline",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(err)
            }
        }
    }

    /// Baseline plus a single extension.
    ///
    /// # Errors
    ///
    /// Returns the baseline error or the extension's build error.
    pub fn build_with_extension(
        &self,
        extension: Arc<dyn SchemaExtension>,
    ) -> Result<SchemaSnapshot, SchemaError> {
        self.build(&BuildOptions::default().with_plugin(extension))
    }
}

impl SchemaFactory for SchemaAssembler {
    fn baseline(&self) -> Result<Arc<SchemaSnapshot>, SchemaError> {
        self.build_baseline()
    }

    fn build(&self, options: &BuildOptions) -> Result<SchemaSnapshot, SchemaError> {
        let baseline = self.build_baseline()?;
        apply_extensions(&baseline, &options.append_plugins)
    }
}

/// Apply `extensions` in order to a copy of `baseline` and validate the result.
///
/// # Errors
///
/// Returns the first error raised by an extension or by validation.
pub fn apply_extensions(
    baseline: &SchemaSnapshot,
    extensions: &[Arc<dyn SchemaExtension>],
) -> Result<SchemaSnapshot, SchemaError> {
    let mut builder = SchemaBuilder::from_snapshot(baseline);
    for extension in extensions {
        tracing::debug!(extension = extension.name(), "applying extension");
        extension.apply(&mut builder)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::extension::FnExtension;
    use crate::schema::model::{FieldDef, TypeDef, TypeKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn baseline_document() -> SchemaDocument {
        SchemaDocument::from_yaml_str(
            r#"
types:
  Query:
    kind: object
    fields:
      ping: String
"#,
        )
        .unwrap()
    }

    fn add_pong() -> Arc<dyn SchemaExtension> {
        Arc::new(FnExtension::new("addPong", |b: &mut SchemaBuilder| {
            b.add_field("Query", "pong", FieldDef::new("String"))
        }))
    }

    #[test]
    fn test_baseline_is_built_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let assembler = SchemaAssembler::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            SchemaBuilder::from_document(baseline_document()).finish()
        });

        let a = assembler.baseline().unwrap();
        let b = assembler.baseline().unwrap();
        assembler.build(&BuildOptions::default()).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_snapshot_is_preseeded() {
        let snapshot = SchemaBuilder::from_document(baseline_document())
            .finish()
            .unwrap();
        let assembler = SchemaAssembler::from_snapshot(snapshot.clone());

        let baseline = assembler.baseline().unwrap();
        assert_eq!(*baseline, snapshot);
        assert!(Arc::ptr_eq(&baseline, &assembler.baseline().unwrap()));

        let modified = assembler
            .build(&BuildOptions::default().with_plugin(add_pong()))
            .unwrap();
        assert_eq!(modified.get("Query").unwrap().fields.len(), 2);
        assert_eq!(assembler.baseline().unwrap().get("Query").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_extended_build_leaves_baseline_untouched() {
        let assembler = SchemaAssembler::from_document(baseline_document());
        let extended = assembler.build_with_extension(add_pong()).unwrap();
        let baseline = assembler.baseline().unwrap();

        assert!(extended.get("Query").unwrap().fields.contains_key("pong"));
        assert!(!baseline.get("Query").unwrap().fields.contains_key("pong"));
    }

    #[test]
    fn test_extensions_do_not_accumulate() {
        let assembler = SchemaAssembler::from_document(baseline_document());
        let add_health = Arc::new(FnExtension::new("addHealth", |b: &mut SchemaBuilder| {
            b.add_type("Health", TypeDef::new(TypeKind::Scalar))
        }));

        assembler.build_with_extension(add_pong()).unwrap();
        let second = assembler.build_with_extension(add_health).unwrap();

        assert!(!second.get("Query").unwrap().fields.contains_key("pong"));
        assert!(second.get("Health").is_some());
    }

    #[test]
    fn test_conflicting_extension_fails() {
        let assembler = SchemaAssembler::from_document(baseline_document());
        let conflict = Arc::new(FnExtension::new("redefinePing", |b: &mut SchemaBuilder| {
            b.add_field("Query", "ping", FieldDef::new("Int"))
        }));
        let err = assembler.build_with_extension(conflict).unwrap_err();
        assert!(matches!(err, SchemaError::FieldAlreadyExists { .. }));
    }

    #[test]
    fn test_baseline_failure_is_reported_and_not_cached() {
        let assembler = SchemaAssembler::new(|| {
            Err(SchemaError::Document {
                message: "missing".to_string(),
            })
        });
        assert!(assembler.baseline().is_err());
        assert!(assembler.build(&BuildOptions::default()).is_err());
    }
}
