//! Schema snapshot types.
//!
//! Every collection is a `BTreeMap`/`BTreeSet`, so declaration order in a
//! source document is never observable: two documents that differ only in
//! ordering produce equal snapshots and equal digests.

use crate::errors::{ExError, SchemaError};
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Arguments of an applied directive, keyed by argument name.
pub type DirectiveArgs = BTreeMap<String, serde_json::Value>;

/// Kind of a named type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    Input,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Scalar => "scalar",
            TypeKind::Input => "input",
        }
    }

    /// Object, interface and input types carry fields.
    pub fn allows_fields(&self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Input)
    }

    /// Enum values and union member types are stored as members.
    pub fn allows_members(&self) -> bool {
        matches!(self, TypeKind::Union | TypeKind::Enum)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An argument of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgDef {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgDef {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A field of an object, interface or input type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, ArgDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub directives: BTreeMap<String, DirectiveArgs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            args: BTreeMap::new(),
            directives: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, arg: ArgDef) -> Self {
        self.args.insert(name.into(), arg);
        self
    }

    pub fn with_directive(mut self, name: impl Into<String>, args: DirectiveArgs) -> Self {
        self.directives.insert(name.into(), args);
        self
    }
}

/// A named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldDef>,
    /// Enum values or union member types
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub members: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub directives: BTreeMap<String, DirectiveArgs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeDef {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            members: BTreeSet::new(),
            directives: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: FieldDef) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.insert(member.into());
        self
    }

    pub fn with_directive(mut self, name: impl Into<String>, args: DirectiveArgs) -> Self {
        self.directives.insert(name.into(), args);
        self
    }
}

// ---------------------------------------------------------------------------
// Shorthand deserialization: `ping: String` is the same as `ping: {type: String}`
// ---------------------------------------------------------------------------

trait FromTypeRef {
    fn from_type_ref(type_ref: &str) -> Self;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDefRepr {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    args: BTreeMap<String, ArgDef>,
    #[serde(default)]
    directives: BTreeMap<String, DirectiveArgs>,
    #[serde(default)]
    description: Option<String>,
}

impl FromTypeRef for FieldDefRepr {
    fn from_type_ref(type_ref: &str) -> Self {
        Self {
            ty: type_ref.to_string(),
            args: BTreeMap::new(),
            directives: BTreeMap::new(),
            description: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgDefRepr {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

impl FromTypeRef for ArgDefRepr {
    fn from_type_ref(type_ref: &str) -> Self {
        Self {
            ty: type_ref.to_string(),
            default: None,
            description: None,
        }
    }
}

struct ShorthandVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for ShorthandVisitor<T>
where
    T: DeserializeOwned + FromTypeRef,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a type reference string or a map with a 'type' field")
    }

    fn visit_str<E>(self, value: &str) -> Result<T, E>
    where
        E: de::Error,
    {
        Ok(T::from_type_ref(value))
    }

    fn visit_map<M>(self, map: M) -> Result<T, M::Error>
    where
        M: MapAccess<'de>,
    {
        T::deserialize(de::value::MapAccessDeserializer::new(map))
    }
}

impl<'de> Deserialize<'de> for FieldDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr: FieldDefRepr =
            deserializer.deserialize_any(ShorthandVisitor::<FieldDefRepr>(PhantomData))?;
        Ok(FieldDef {
            ty: repr.ty,
            args: repr.args,
            directives: repr.directives,
            description: repr.description,
        })
    }
}

impl<'de> Deserialize<'de> for ArgDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr: ArgDefRepr =
            deserializer.deserialize_any(ShorthandVisitor::<ArgDefRepr>(PhantomData))?;
        Ok(ArgDef {
            ty: repr.ty,
            default: repr.default,
            description: repr.description,
        })
    }
}

// ---------------------------------------------------------------------------
// Documents and snapshots
// ---------------------------------------------------------------------------

/// Serialized form of a schema, as written in a baseline file
///
/// YAML is a superset of JSON, so the same parser reads both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub types: BTreeMap<String, TypeDef>,
}

impl SchemaDocument {
    /// Parse a document from YAML or JSON text.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Document` when the text is not a valid document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Document {
            message: e.to_string(),
        })
    }

    /// Read and parse a document file.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Document` when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Document {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            SchemaError::Document { message } => SchemaError::Document {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }
}

/// An immutable, fully-resolved schema
///
/// Snapshots are only produced by [`SchemaBuilder::finish`](super::SchemaBuilder::finish),
/// which validates type references, so every snapshot is internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    types: BTreeMap<String, TypeDef>,
}

impl SchemaSnapshot {
    pub(crate) fn from_validated(types: BTreeMap<String, TypeDef>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &BTreeMap<String, TypeDef> {
        &self.types
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Copy the snapshot back into its serialized document form.
    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            types: self.types.clone(),
        }
    }

    /// Hex-encoded SHA-256 of the canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if the snapshot cannot be encoded.
    pub fn digest(&self) -> Result<String, ExError> {
        let canonical = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
