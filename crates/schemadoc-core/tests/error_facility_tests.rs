use schemadoc_core::errors::{ExError, ExErrorKind, ExampleError, LoadError, SchemaError};
use std::path::PathBuf;

#[test]
fn test_module_not_found_verifiable_by_kind() {
    let err = LoadError::ModuleNotFound {
        specifier: "./shared.yaml".to_string(),
        from: PathBuf::from("/docs/examples"),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::ModuleNotFound);
    assert_eq!(ex_err.code(), "ERR_MODULE_NOT_FOUND");
    assert_eq!(ex_err.op(), Some("require"));
    assert_eq!(ex_err.path(), Some("/docs/examples"));
}

#[test]
fn test_conflict_distinct_from_not_found() {
    let conflict: ExError = SchemaError::TypeAlreadyExists {
        type_name: "Pong".to_string(),
    }
    .into();
    let missing: ExError = SchemaError::TypeNotFound {
        type_name: "Pong".to_string(),
    }
    .into();

    assert_eq!(conflict.kind(), ExErrorKind::Conflict);
    assert_eq!(missing.kind(), ExErrorKind::NotFound);
    assert_eq!(conflict.path(), missing.path());
}

#[test]
fn test_directive_paths_use_at_sign() {
    let err: ExError = SchemaError::DirectiveAlreadyApplied {
        target: "Query.ping".to_string(),
        directive: "deprecated".to_string(),
    }
    .into();
    assert_eq!(err.path(), Some("Query.ping@deprecated"));
    assert_eq!(err.code(), "ERR_CONFLICT");
}

#[test]
fn test_invalid_extension_structured_fields() {
    let err: ExError = SchemaError::InvalidExtension {
        reason: "unknown variant `rename_type`".to_string(),
    }
    .into();

    assert_eq!(err.kind(), ExErrorKind::InvalidExtension);
    assert_eq!(err.code(), "ERR_INVALID_EXTENSION");
    assert!(err.message().contains("Invalid extension"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::Load, "ERR_LOAD"),
        (ExErrorKind::RequireCycle, "ERR_REQUIRE_CYCLE"),
        (ExErrorKind::MissingExports, "ERR_MISSING_EXPORTS"),
        (ExErrorKind::SchemaBuild, "ERR_SCHEMA_BUILD"),
        (ExErrorKind::DiffInternal, "ERR_DIFF_INTERNAL"),
        (ExErrorKind::DeterminismViolation, "ERR_DETERMINISM_VIOLATION"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_example_error_display_names_example() {
    let err = ExampleError::Load {
        example: "addPong".to_string(),
        source: LoadError::MissingExports {
            path: PathBuf::from("/ex/addPongPlugin.yaml"),
            reason: "`exports` is missing or null".to_string(),
        },
    };
    let text = err.to_string();
    assert!(text.starts_with("Example 'addPong' failed to load"));
    assert!(text.contains("/ex/addPongPlugin.yaml"));
}

#[test]
fn test_diff_internal_is_its_own_kind() {
    let err: ExError = ExampleError::DiffInternal {
        example: "addPong".to_string(),
        message: "entries out of order".to_string(),
    }
    .into();
    assert_eq!(err.kind(), ExErrorKind::DiffInternal);
    assert_eq!(err.example_id(), Some("addPong"));
    assert!(err.source_error().is_none());
}
