//! Schema diff output types.
//!
//! Entries are totally ordered so that the rendered delta is byte-stable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Broad direction of a change; also its sort priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

impl ChangeKind {
    /// Line marker used by the text rendering
    pub fn marker(&self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Changed => '~',
        }
    }
}

/// What changed, and at which level of the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    TypeAdded,
    TypeRemoved,
    TypeChanged,
    FieldAdded,
    FieldRemoved,
    FieldChanged,
    ArgAdded,
    ArgRemoved,
    ArgChanged,
    DirectiveAdded,
    DirectiveRemoved,
    DirectiveChanged,
    MemberAdded,
    MemberRemoved,
}

impl DiffKind {
    pub fn change(&self) -> ChangeKind {
        match self {
            DiffKind::TypeAdded
            | DiffKind::FieldAdded
            | DiffKind::ArgAdded
            | DiffKind::DirectiveAdded
            | DiffKind::MemberAdded => ChangeKind::Added,
            DiffKind::TypeRemoved
            | DiffKind::FieldRemoved
            | DiffKind::ArgRemoved
            | DiffKind::DirectiveRemoved
            | DiffKind::MemberRemoved => ChangeKind::Removed,
            DiffKind::TypeChanged
            | DiffKind::FieldChanged
            | DiffKind::ArgChanged
            | DiffKind::DirectiveChanged => ChangeKind::Changed,
        }
    }
}

/// One difference between two snapshots
///
/// `before`/`after` are set only for `Changed` kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl DiffEntry {
    pub fn added(kind: DiffKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            before: None,
            after: None,
        }
    }

    pub fn removed(kind: DiffKind, path: impl Into<String>) -> Self {
        Self::added(kind, path)
    }

    pub fn changed(
        kind: DiffKind,
        path: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            before: Some(before.into()),
            after: Some(after.into()),
        }
    }

    pub fn change(&self) -> ChangeKind {
        self.kind.change()
    }

    fn sort_key(&self) -> (&str, ChangeKind, DiffKind) {
        (&self.path, self.kind.change(), self.kind)
    }
}

impl Ord for DiffEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.before.cmp(&other.before))
            .then_with(|| self.after.cmp(&other.after))
    }
}

impl PartialOrd for DiffEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = self.change().marker();
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => {
                write!(f, "{} {}: {} -> {}", marker, self.path, before, after)
            }
            _ => write!(f, "{} {}", marker, self.path),
        }
    }
}

/// Digest identity of both sides of a diff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffIdentity {
    pub before_digest: String,
    pub after_digest: String,
}

/// High-level classification of the diff result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiffClassification {
    /// Both snapshots have the same digest
    Identical,
    /// Snapshots differ only in parts the diff ignores, such as descriptions
    NoStructuralChange,
    Changed,
}

/// The structured diff between two snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaDiff {
    /// Schema version of this diff structure (always 1)
    pub diff_schema_version: u32,
    pub identity: DiffIdentity,
    pub classification: DiffClassification,
    /// Sorted by path, then change priority, then kind
    pub entries: Vec<DiffEntry>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given change kind
    pub fn count(&self, change: ChangeKind) -> usize {
        self.entries.iter().filter(|e| e.change() == change).count()
    }
}
