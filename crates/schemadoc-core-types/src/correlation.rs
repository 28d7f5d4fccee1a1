//! Correlation types for batch tracking and tracing
//!
//! A batch run processes many examples, possibly in parallel. Every event
//! emitted on behalf of a run carries the same `RunId` so log lines from
//! interleaved workers can be grouped again.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single batch run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new random RunId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through a batch run for correlation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    /// Free-form label for the run (e.g. the examples directory)
    pub label: Option<String>,
}

impl RunContext {
    /// Create a new context with a fresh RunId
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            label: None,
        }
    }

    /// Create a context with an existing RunId
    pub fn with_run_id(run_id: RunId) -> Self {
        Self {
            run_id,
            label: None,
        }
    }

    /// Attach a label to the context
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_generation() {
        let id1 = RunId::new();
        let id2 = RunId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_run_id_display() {
        let id = RunId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_run_context_with_label() {
        let ctx = RunContext::new().with_label("docs/examples");
        assert_eq!(ctx.label.as_deref(), Some("docs/examples"));
        assert!(!ctx.run_id.as_str().is_empty());
    }

    #[test]
    fn test_run_context_keeps_given_id() {
        let id = RunId::from_string("run-1".to_string());
        let ctx = RunContext::with_run_id(id.clone());
        assert_eq!(ctx.run_id, id);
        assert!(ctx.label.is_none());
    }

    #[test]
    fn test_serialization() {
        let id = RunId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
