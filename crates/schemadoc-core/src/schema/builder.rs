//! Mutable schema under construction.
//!
//! A builder is always a private copy: [`SchemaBuilder::from_snapshot`] clones
//! the snapshot it starts from, so applying an extension can never reach back
//! into the baseline it was built on.

use super::model::{DirectiveArgs, FieldDef, SchemaDocument, SchemaSnapshot, TypeDef, TypeKind};
use super::type_ref::{is_builtin_scalar, is_valid_name, TypeRef};
use crate::errors::SchemaError;
use std::collections::BTreeMap;

/// Where a directive is applied: a type, or a field of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveTarget {
    Type(String),
    Field(String, String),
}

impl DirectiveTarget {
    /// Parse `Type` or `Type.field`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidExtension` for empty segments or deeper paths.
    pub fn parse(target: &str) -> Result<Self, SchemaError> {
        let invalid = || SchemaError::InvalidExtension {
            reason: format!(
                "directive target '{}' must be 'Type' or 'Type.field'",
                target
            ),
        };
        let mut parts = target.split('.');
        let type_name = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        match (parts.next(), parts.next()) {
            (None, _) => Ok(DirectiveTarget::Type(type_name.to_string())),
            (Some(field), None) if !field.is_empty() => Ok(DirectiveTarget::Field(
                type_name.to_string(),
                field.to_string(),
            )),
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for DirectiveTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectiveTarget::Type(t) => write!(f, "{}", t),
            DirectiveTarget::Field(t, field) => write!(f, "{}.{}", t, field),
        }
    }
}

/// Copy-on-write schema builder
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    types: BTreeMap<String, TypeDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an independent copy of `snapshot`.
    pub fn from_snapshot(snapshot: &SchemaSnapshot) -> Self {
        Self {
            types: snapshot.types().clone(),
        }
    }

    pub fn from_document(document: SchemaDocument) -> Self {
        Self {
            types: document.types,
        }
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Add a new type.
    ///
    /// # Errors
    ///
    /// `TypeAlreadyExists` when the name is taken, `InvalidExtension` when the
    /// name is not a valid identifier.
    pub fn add_type(&mut self, name: &str, def: TypeDef) -> Result<(), SchemaError> {
        if !is_valid_name(name) {
            return Err(SchemaError::InvalidExtension {
                reason: format!("'{}' is not a valid type name", name),
            });
        }
        if self.types.contains_key(name) {
            return Err(SchemaError::TypeAlreadyExists {
                type_name: name.to_string(),
            });
        }
        self.types.insert(name.to_string(), def);
        Ok(())
    }

    /// Remove a type and return its definition.
    ///
    /// # Errors
    ///
    /// `TypeNotFound` when the type does not exist.
    pub fn remove_type(&mut self, name: &str) -> Result<TypeDef, SchemaError> {
        self.types
            .remove(name)
            .ok_or_else(|| SchemaError::TypeNotFound {
                type_name: name.to_string(),
            })
    }

    fn type_mut(&mut self, name: &str) -> Result<&mut TypeDef, SchemaError> {
        self.types
            .get_mut(name)
            .ok_or_else(|| SchemaError::TypeNotFound {
                type_name: name.to_string(),
            })
    }

    /// Add a field that does not exist yet.
    ///
    /// # Errors
    ///
    /// `TypeNotFound`, `FieldsNotAllowed` for kinds without fields, or
    /// `FieldAlreadyExists` when the field is already defined.
    pub fn add_field(
        &mut self,
        type_name: &str,
        field: &str,
        def: FieldDef,
    ) -> Result<(), SchemaError> {
        if !is_valid_name(field) {
            return Err(SchemaError::InvalidExtension {
                reason: format!("'{}' is not a valid field name", field),
            });
        }
        let ty = self.type_mut(type_name)?;
        if !ty.kind.allows_fields() {
            return Err(SchemaError::FieldsNotAllowed {
                type_name: type_name.to_string(),
                kind: ty.kind.to_string(),
            });
        }
        if ty.fields.contains_key(field) {
            return Err(SchemaError::FieldAlreadyExists {
                type_name: type_name.to_string(),
                field: field.to_string(),
            });
        }
        ty.fields.insert(field.to_string(), def);
        Ok(())
    }

    /// Replace an existing field and return the previous definition.
    ///
    /// # Errors
    ///
    /// `TypeNotFound` or `FieldNotFound`.
    pub fn replace_field(
        &mut self,
        type_name: &str,
        field: &str,
        def: FieldDef,
    ) -> Result<FieldDef, SchemaError> {
        let ty = self.type_mut(type_name)?;
        match ty.fields.get_mut(field) {
            Some(existing) => Ok(std::mem::replace(existing, def)),
            None => Err(SchemaError::FieldNotFound {
                type_name: type_name.to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Remove a field and return its definition.
    ///
    /// # Errors
    ///
    /// `TypeNotFound` or `FieldNotFound`.
    pub fn remove_field(&mut self, type_name: &str, field: &str) -> Result<FieldDef, SchemaError> {
        let ty = self.type_mut(type_name)?;
        ty.fields
            .remove(field)
            .ok_or_else(|| SchemaError::FieldNotFound {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })
    }

    /// Add enum values or union member types.
    ///
    /// # Errors
    ///
    /// `TypeNotFound`, `MembersNotAllowed`, or `MemberAlreadyExists`.
    pub fn add_member(&mut self, type_name: &str, member: &str) -> Result<(), SchemaError> {
        let ty = self.type_mut(type_name)?;
        if !ty.kind.allows_members() {
            return Err(SchemaError::MembersNotAllowed {
                type_name: type_name.to_string(),
                kind: ty.kind.to_string(),
            });
        }
        if !ty.members.insert(member.to_string()) {
            return Err(SchemaError::MemberAlreadyExists {
                type_name: type_name.to_string(),
                member: member.to_string(),
            });
        }
        Ok(())
    }

    fn directives_mut(
        &mut self,
        target: &DirectiveTarget,
    ) -> Result<&mut BTreeMap<String, DirectiveArgs>, SchemaError> {
        match target {
            DirectiveTarget::Type(type_name) => Ok(&mut self.type_mut(type_name)?.directives),
            DirectiveTarget::Field(type_name, field) => {
                let ty = self.type_mut(type_name)?;
                ty.fields
                    .get_mut(field)
                    .map(|f| &mut f.directives)
                    .ok_or_else(|| SchemaError::FieldNotFound {
                        type_name: type_name.clone(),
                        field: field.clone(),
                    })
            }
        }
    }

    /// Apply a directive to a type or field.
    ///
    /// # Errors
    ///
    /// `TypeNotFound`/`FieldNotFound` for a missing target, or
    /// `DirectiveAlreadyApplied` when the directive is present already.
    pub fn add_directive(
        &mut self,
        target: &DirectiveTarget,
        name: &str,
        args: DirectiveArgs,
    ) -> Result<(), SchemaError> {
        let directives = self.directives_mut(target)?;
        if directives.contains_key(name) {
            return Err(SchemaError::DirectiveAlreadyApplied {
                target: target.to_string(),
                directive: name.to_string(),
            });
        }
        directives.insert(name.to_string(), args);
        Ok(())
    }

    /// Remove a directive from a type or field.
    ///
    /// # Errors
    ///
    /// `TypeNotFound`/`FieldNotFound` for a missing target, or
    /// `DirectiveNotFound` when the directive is not applied.
    pub fn remove_directive(
        &mut self,
        target: &DirectiveTarget,
        name: &str,
    ) -> Result<DirectiveArgs, SchemaError> {
        let directives = self.directives_mut(target)?;
        directives
            .remove(name)
            .ok_or_else(|| SchemaError::DirectiveNotFound {
                target: target.to_string(),
                directive: name.to_string(),
            })
    }

    /// Validate and freeze the schema.
    ///
    /// Type references are normalized to their canonical display form.
    ///
    /// # Errors
    ///
    /// The first violation in type-name order: `InvalidName`,
    /// `FieldsNotAllowed`, `MembersNotAllowed`, `InvalidUnionMember`,
    /// `InvalidTypeRef` or `UnknownTypeReference`.
    pub fn finish(self) -> Result<SchemaSnapshot, SchemaError> {
        let mut types = self.types;
        let kinds: BTreeMap<String, TypeKind> =
            types.iter().map(|(name, def)| (name.clone(), def.kind)).collect();
        let resolve = |path: String, raw: &str| -> Result<String, SchemaError> {
            let parsed = TypeRef::parse(raw)?;
            let named = parsed.named_type();
            if !kinds.contains_key(named) && !is_builtin_scalar(named) {
                return Err(SchemaError::UnknownTypeReference {
                    path,
                    type_name: named.to_string(),
                });
            }
            Ok(parsed.to_string())
        };

        let check_name = |name: &str, path: &dyn Fn() -> String| {
            if is_valid_name(name) {
                Ok(())
            } else {
                Err(SchemaError::InvalidName { path: path() })
            }
        };

        for (type_name, def) in types.iter_mut() {
            check_name(type_name, &|| type_name.clone())?;
            for member in &def.members {
                check_name(member, &|| format!("{}.{}", type_name, member))?;
            }
            if !def.kind.allows_fields() && !def.fields.is_empty() {
                return Err(SchemaError::FieldsNotAllowed {
                    type_name: type_name.clone(),
                    kind: def.kind.to_string(),
                });
            }
            if !def.kind.allows_members() && !def.members.is_empty() {
                return Err(SchemaError::MembersNotAllowed {
                    type_name: type_name.clone(),
                    kind: def.kind.to_string(),
                });
            }
            if def.kind == TypeKind::Union {
                for member in &def.members {
                    if kinds.get(member) != Some(&TypeKind::Object) {
                        return Err(SchemaError::InvalidUnionMember {
                            type_name: type_name.clone(),
                            member: member.clone(),
                        });
                    }
                }
            }
            for (field_name, field) in def.fields.iter_mut() {
                let field_path = format!("{}.{}", type_name, field_name);
                check_name(field_name, &|| field_path.clone())?;
                field.ty = resolve(field_path.clone(), &field.ty)?;
                for (arg_name, arg) in field.args.iter_mut() {
                    check_name(arg_name, &|| format!("{}.{}", field_path, arg_name))?;
                    arg.ty = resolve(format!("{}.{}", field_path, arg_name), &arg.ty)?;
                }
            }
        }

        Ok(SchemaSnapshot::from_validated(types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::ArgDef;

    fn query_ping() -> SchemaSnapshot {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(
                "Query",
                TypeDef::new(TypeKind::Object).with_field("ping", FieldDef::new("String")),
            )
            .unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn test_builder_from_snapshot_is_independent_copy() {
        let baseline = query_ping();
        let mut builder = SchemaBuilder::from_snapshot(&baseline);
        builder
            .add_field("Query", "pong", FieldDef::new("String"))
            .unwrap();
        let modified = builder.finish().unwrap();

        assert_eq!(baseline.get("Query").unwrap().fields.len(), 1);
        assert_eq!(modified.get("Query").unwrap().fields.len(), 2);
    }

    #[test]
    fn test_add_field_conflict() {
        let mut builder = SchemaBuilder::from_snapshot(&query_ping());
        let err = builder
            .add_field("Query", "ping", FieldDef::new("Int"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::FieldAlreadyExists {
                type_name: "Query".to_string(),
                field: "ping".to_string()
            }
        );
    }

    #[test]
    fn test_replace_field_returns_previous() {
        let mut builder = SchemaBuilder::from_snapshot(&query_ping());
        let previous = builder
            .replace_field("Query", "ping", FieldDef::new("Int"))
            .unwrap();
        assert_eq!(previous.ty, "String");
    }

    #[test]
    fn test_fields_rejected_on_enum() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type("Episode", TypeDef::new(TypeKind::Enum).with_member("JEDI"))
            .unwrap();
        let err = builder
            .add_field("Episode", "name", FieldDef::new("String"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::FieldsNotAllowed { .. }));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type("Episode", TypeDef::new(TypeKind::Enum).with_member("JEDI"))
            .unwrap();
        let err = builder.add_member("Episode", "JEDI").unwrap_err();
        assert!(matches!(err, SchemaError::MemberAlreadyExists { .. }));
    }

    #[test]
    fn test_finish_rejects_unknown_reference() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(
                "Query",
                TypeDef::new(TypeKind::Object).with_field("me", FieldDef::new("User!")),
            )
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownTypeReference {
                path: "Query.me".to_string(),
                type_name: "User".to_string()
            }
        );
    }

    #[test]
    fn test_finish_checks_argument_types() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(
                "Query",
                TypeDef::new(TypeKind::Object).with_field(
                    "node",
                    FieldDef::new("String").with_arg("id", ArgDef::new("NodeId")),
                ),
            )
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownTypeReference { ref path, .. } if path == "Query.node.id"
        ));
    }

    #[test]
    fn test_finish_normalizes_type_refs() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(
                "Query",
                TypeDef::new(TypeKind::Object).with_field("ids", FieldDef::new("[ ID ! ]")),
            )
            .unwrap();
        let snapshot = builder.finish().unwrap();
        assert_eq!(snapshot.get("Query").unwrap().fields["ids"].ty, "[ID!]");
    }

    #[test]
    fn test_finish_rejects_document_names_that_are_not_identifiers() {
        let cases = [
            (
                r#"
types:
  Query:
    kind: object
    fields:
      a.b: String
"#,
                "Query.a.b",
            ),
            (
                r#"
types:
  Query:
    kind: object
    fields:
      node:
        type: String
        args:
          id-x: ID
"#,
                "Query.node.id-x",
            ),
            (
                r#"
types:
  Episode:
    kind: enum
    members: [JEDI, "NEW HOPE"]
"#,
                "Episode.NEW HOPE",
            ),
        ];
        for (yaml, path) in cases {
            let doc = SchemaDocument::from_yaml_str(yaml).unwrap();
            let err = SchemaBuilder::from_document(doc).finish().unwrap_err();
            assert_eq!(
                err,
                SchemaError::InvalidName {
                    path: path.to_string()
                }
            );
        }
    }

    #[test]
    fn test_finish_rejects_deeply_nested_reference_without_overflow() {
        let deep = format!("{}Int{}", "[".repeat(200_000), "]".repeat(200_000));
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(
                "Query",
                TypeDef::new(TypeKind::Object).with_field("deep", FieldDef::new(deep)),
            )
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeRef { .. }));
    }

    #[test]
    fn test_union_members_must_be_objects() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type("Episode", TypeDef::new(TypeKind::Enum).with_member("JEDI"))
            .unwrap();
        builder
            .add_type(
                "SearchResult",
                TypeDef::new(TypeKind::Union).with_member("Episode"),
            )
            .unwrap();
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidUnionMember { .. }));
    }

    #[test]
    fn test_directive_target_parse() {
        assert_eq!(
            DirectiveTarget::parse("Query").unwrap(),
            DirectiveTarget::Type("Query".to_string())
        );
        assert_eq!(
            DirectiveTarget::parse("Query.ping").unwrap(),
            DirectiveTarget::Field("Query".to_string(), "ping".to_string())
        );
        assert!(DirectiveTarget::parse("Query.ping.arg").is_err());
        assert!(DirectiveTarget::parse(".ping").is_err());
    }

    #[test]
    fn test_directive_add_and_remove() {
        let mut builder = SchemaBuilder::from_snapshot(&query_ping());
        let target = DirectiveTarget::parse("Query.ping").unwrap();
        builder
            .add_directive(&target, "deprecated", DirectiveArgs::new())
            .unwrap();
        assert!(matches!(
            builder.add_directive(&target, "deprecated", DirectiveArgs::new()),
            Err(SchemaError::DirectiveAlreadyApplied { .. })
        ));
        builder.remove_directive(&target, "deprecated").unwrap();
        assert!(matches!(
            builder.remove_directive(&target, "deprecated"),
            Err(SchemaError::DirectiveNotFound { .. })
        ));
    }
}
