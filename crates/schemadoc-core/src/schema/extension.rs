//! Schema extensions.
//!
//! An extension is anything that can mutate a [`SchemaBuilder`]. Example
//! modules export a declarative extension: a list of hooks, each naming one
//! builder operation. Code can register closures through [`FnExtension`].

use super::builder::{DirectiveTarget, SchemaBuilder};
use super::model::{DirectiveArgs, FieldDef, TypeDef};
use crate::errors::SchemaError;
use crate::loader::ExtensionObject;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A unit of schema mutation applied on top of a baseline
pub trait SchemaExtension: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Apply this extension to the builder.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError` raised by a builder operation.
    fn apply(&self, builder: &mut SchemaBuilder) -> Result<(), SchemaError>;
}

impl fmt::Debug for dyn SchemaExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaExtension")
            .field("name", &self.name())
            .finish()
    }
}

/// Extension backed by a closure
pub struct FnExtension<F> {
    name: String,
    f: F,
}

impl<F> FnExtension<F>
where
    F: Fn(&mut SchemaBuilder) -> Result<(), SchemaError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SchemaExtension for FnExtension<F>
where
    F: Fn(&mut SchemaBuilder) -> Result<(), SchemaError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, builder: &mut SchemaBuilder) -> Result<(), SchemaError> {
        (self.f)(builder)
    }
}

/// Additions to an existing type
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeExtension {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// One schema operation inside a declarative extension
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Hook {
    AddType(BTreeMap<String, TypeDef>),
    ExtendType(BTreeMap<String, TypeExtension>),
    ReplaceField {
        on: String,
        name: String,
        field: FieldDef,
    },
    RemoveField {
        on: String,
        name: String,
    },
    RemoveType {
        name: String,
    },
    AddDirective {
        on: String,
        name: String,
        #[serde(default)]
        args: DirectiveArgs,
    },
    RemoveDirective {
        on: String,
        name: String,
    },
    /// Hooks of another extension, usually pulled in with `!require`
    Include(ExtensionSpec),
}

impl Hook {
    fn apply(&self, builder: &mut SchemaBuilder) -> Result<(), SchemaError> {
        match self {
            Hook::AddType(types) => {
                for (name, def) in types {
                    builder.add_type(name, def.clone())?;
                }
            }
            Hook::ExtendType(types) => {
                for (type_name, ext) in types {
                    if !builder.contains_type(type_name) {
                        return Err(SchemaError::TypeNotFound {
                            type_name: type_name.clone(),
                        });
                    }
                    for (field, def) in &ext.fields {
                        builder.add_field(type_name, field, def.clone())?;
                    }
                    for member in &ext.members {
                        builder.add_member(type_name, member)?;
                    }
                }
            }
            Hook::ReplaceField { on, name, field } => {
                builder.replace_field(on, name, field.clone())?;
            }
            Hook::RemoveField { on, name } => {
                builder.remove_field(on, name)?;
            }
            Hook::RemoveType { name } => {
                builder.remove_type(name)?;
            }
            Hook::AddDirective { on, name, args } => {
                builder.add_directive(&DirectiveTarget::parse(on)?, name, args.clone())?;
            }
            Hook::RemoveDirective { on, name } => {
                builder.remove_directive(&DirectiveTarget::parse(on)?, name)?;
            }
            Hook::Include(spec) => {
                for hook in &spec.hooks {
                    hook.apply(builder)?;
                }
            }
        }
        Ok(())
    }
}

/// Shape of an exported extension object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
}

/// Extension described by data rather than code
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarativeExtension {
    name: String,
    description: Option<String>,
    hooks: Vec<Hook>,
}

impl DeclarativeExtension {
    /// Interpret an exported object as an extension.
    ///
    /// Objects without a `name` are named after their source file.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidExtension` when the object does not match
    /// the extension shape.
    pub fn from_object(object: &ExtensionObject) -> Result<Self, SchemaError> {
        // serde_json handles externally tagged enums from plain maps, which
        // serde_yaml::Value only accepts as YAML tags.
        let json = serde_json::to_value(object.value()).map_err(|e| {
            SchemaError::InvalidExtension {
                reason: format!("{}: {}", object.path().display(), e),
            }
        })?;
        let spec: ExtensionSpec =
            serde_json::from_value(json).map_err(|e| SchemaError::InvalidExtension {
                reason: format!("{}: {}", object.path().display(), e),
            })?;
        let name = spec.name.unwrap_or_else(|| {
            object
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Ok(Self {
            name,
            description: spec.description,
            hooks: spec.hooks,
        })
    }

    pub fn new(name: impl Into<String>, hooks: Vec<Hook>) -> Self {
        Self {
            name: name.into(),
            description: None,
            hooks,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }
}

impl SchemaExtension for DeclarativeExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, builder: &mut SchemaBuilder) -> Result<(), SchemaError> {
        for hook in &self.hooks {
            hook.apply(builder)?;
        }
        Ok(())
    }
}
