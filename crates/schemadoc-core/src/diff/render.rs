//! Text renderers for schema diffs.

use crate::diff::model::{ChangeKind, DiffClassification, DiffEntry, SchemaDiff};

/// One line per entry, each terminated by `\n`; empty input renders as "".
///
/// ```text
/// + Query.pong
/// - Query.legacy
/// ~ Query.ping: String -> Int
/// ```
pub fn render_text(entries: &[DiffEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

/// Human-readable summary of a [`SchemaDiff`] for review output.
pub fn render_summary(diff: &SchemaDiff) -> String {
    let mut out = String::new();

    out.push_str("## Schema Diff\n\n");

    let class_label = match diff.classification {
        DiffClassification::Identical => "Identical",
        DiffClassification::NoStructuralChange => "No Structural Change",
        DiffClassification::Changed => "Changed",
    };
    out.push_str(&format!("**Classification**: {class_label}\n\n"));
    out.push_str(&format!(
        "| | Digest |\n|---|---|\n| before | `{}` |\n| after | `{}` |\n\n",
        short(&diff.identity.before_digest),
        short(&diff.identity.after_digest),
    ));

    if diff.entries.is_empty() {
        out.push_str("_No structural changes detected._\n");
        return out;
    }

    out.push_str(&format!(
        "{} added, {} removed, {} changed\n\n",
        diff.count(ChangeKind::Added),
        diff.count(ChangeKind::Removed),
        diff.count(ChangeKind::Changed),
    ));
    out.push_str("```diff\n");
    out.push_str(&render_text(&diff.entries));
    out.push_str("```\n");
    out
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{DiffIdentity, DiffKind};

    #[test]
    fn test_render_text_empty() {
        assert_eq!(render_text(&[]), "");
    }

    #[test]
    fn test_render_text_lines() {
        let entries = vec![
            DiffEntry::added(DiffKind::FieldAdded, "Query.pong"),
            DiffEntry::removed(DiffKind::FieldRemoved, "Query.legacy"),
            DiffEntry::changed(DiffKind::FieldChanged, "Query.ping", "String", "Int"),
        ];
        assert_eq!(
            render_text(&entries),
            "+ Query.pong\n- Query.legacy\n~ Query.ping: String -> Int\n"
        );
    }

    #[test]
    fn test_render_summary_counts() {
        let diff = SchemaDiff {
            diff_schema_version: 1,
            identity: DiffIdentity {
                before_digest: "a".repeat(64),
                after_digest: "b".repeat(64),
            },
            classification: DiffClassification::Changed,
            entries: vec![DiffEntry::added(DiffKind::FieldAdded, "Query.pong")],
        };
        let summary = render_summary(&diff);
        assert!(summary.contains("**Classification**: Changed"));
        assert!(summary.contains("`aaaaaaaaaaaa`"));
        assert!(summary.contains("1 added, 0 removed, 0 changed"));
        assert!(summary.contains("+ Query.pong\n"));
    }
}
