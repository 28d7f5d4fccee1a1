//! Type reference parsing.
//!
//! Field and argument types are written the way they appear in an SDL:
//! `Name`, `Name!`, `[Name]`, `[Name!]!` and so on. References are parsed once
//! when a snapshot is finished and stored in their normalized display form,
//! so `[ Int ]` and `[Int]` compare equal in a diff.

use crate::errors::SchemaError;
use std::fmt;

/// Scalars every schema knows without declaring them.
pub const BUILTIN_SCALARS: &[&str] = &["Boolean", "Float", "ID", "Int", "String"];

/// Returns true when `name` is one of the built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Returns true when `name` is a valid type/field identifier (`[_A-Za-z][_0-9A-Za-z]*`).
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Deepest wrapper nesting (`[`/`!` layers) a reference may carry.
pub const MAX_TYPE_REF_DEPTH: usize = 32;

/// A parsed type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Parse a type reference string.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidTypeRef` for empty references, unbalanced
    /// brackets, doubled `!`, names that are not valid identifiers and
    /// references nested deeper than [`MAX_TYPE_REF_DEPTH`].
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        Self::parse_inner(input.trim(), 0).map_err(|reason| SchemaError::InvalidTypeRef {
            type_ref: input.to_string(),
            reason,
        })
    }

    fn parse_inner(s: &str, depth: usize) -> Result<Self, String> {
        if depth > MAX_TYPE_REF_DEPTH {
            return Err(format!("nested deeper than {} levels", MAX_TYPE_REF_DEPTH));
        }
        if s.is_empty() {
            return Err("empty type reference".to_string());
        }
        if let Some(inner) = s.strip_suffix('!') {
            let inner = inner.trim_end();
            let parsed = Self::parse_inner(inner, depth + 1)?;
            if matches!(parsed, TypeRef::NonNull(_)) {
                return Err("non-null marker applied twice".to_string());
            }
            return Ok(TypeRef::NonNull(Box::new(parsed)));
        }
        if let Some(rest) = s.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| "unbalanced list brackets".to_string())?;
            return Ok(TypeRef::List(Box::new(Self::parse_inner(inner.trim(), depth + 1)?)));
        }
        if is_valid_name(s) {
            Ok(TypeRef::Named(s.to_string()))
        } else {
            Err(format!("'{}' is not a valid type name", s))
        }
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_reference() {
        let parsed = TypeRef::parse("[Int!]!").unwrap();
        assert_eq!(
            parsed,
            TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::NonNull(
                Box::new(TypeRef::Named("Int".to_string()))
            )))))
        );
        assert_eq!(parsed.named_type(), "Int");
    }

    #[test]
    fn test_display_normalizes_whitespace() {
        assert_eq!(TypeRef::parse(" [ Int ] ").unwrap().to_string(), "[Int]");
        assert_eq!(TypeRef::parse("[User !]").unwrap().to_string(), "[User!]");
    }

    #[test]
    fn test_rejects_malformed_references() {
        for bad in ["", "[Int", "Int!!", "9Lives", "[]", "Foo-Bar"] {
            assert!(
                matches!(TypeRef::parse(bad), Err(SchemaError::InvalidTypeRef { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = format!("{}Int{}", "[".repeat(16), "]!".repeat(16));
        assert!(TypeRef::parse(&at_limit).is_ok());

        let deep = format!("{}Int{}", "[".repeat(200_000), "]".repeat(200_000));
        match TypeRef::parse(&deep) {
            Err(SchemaError::InvalidTypeRef { reason, .. }) => {
                assert!(reason.contains("nested deeper"), "reason: {}", reason)
            }
            other => panic!("expected InvalidTypeRef, got {:?}", other.map(|t| t.to_string())),
        }
    }

    #[test]
    fn test_builtin_scalars() {
        assert!(is_builtin_scalar("ID"));
        assert!(!is_builtin_scalar("DateTime"));
    }
}
