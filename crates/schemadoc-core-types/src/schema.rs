//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Correlation
pub const FIELD_RUN_ID: &str = "run_id";
pub const FIELD_LABEL: &str = "label";
pub const FIELD_EXAMPLE_ID: &str = "example_id";

// Batch and schema facts
pub const FIELD_DIGEST: &str = "digest";
pub const FIELD_PARALLEL: &str = "parallel";
pub const FIELD_TYPE_COUNT: &str = "type_count";
pub const FIELD_ENTRY_COUNT: &str = "entry_count";
pub const FIELD_EXAMPLE_COUNT: &str = "example_count";
pub const FIELD_BUILT_COUNT: &str = "built_count";
pub const FIELD_FAILED_COUNT: &str = "failed_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_MESSAGE: &str = "err_message";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_error_fields_match_macro_field_names() {
        // The logging macros emit these as literal identifiers.
        assert_eq!(FIELD_ERR_KIND, "err_kind");
        assert_eq!(FIELD_ERR_CODE, "err_code");
        assert_eq!(FIELD_ERR_MESSAGE, "err_message");
        assert_eq!(FIELD_DURATION_MS, "duration_ms");
    }
}
