//! Schema diff computation engine.
//!
//! [`diff_snapshots`] is the pure structural comparison. [`compute_diff`]
//! wraps it with digest identity, classification and a self-check on the
//! ordering of its own output.

use crate::diff::model::{DiffClassification, DiffEntry, DiffIdentity, DiffKind, SchemaDiff};
use crate::errors::{ExError, ExErrorKind};
use crate::schema::model::{ArgDef, DirectiveArgs, FieldDef, SchemaSnapshot, TypeDef};
use std::collections::{BTreeMap, BTreeSet};

/// Key-level delta between two ordered maps.
///
/// Yields every key in either map, in key order, with both sides.
fn zip_keys<'a, V>(
    before: &'a BTreeMap<String, V>,
    after: &'a BTreeMap<String, V>,
) -> impl Iterator<Item = (&'a str, Option<&'a V>, Option<&'a V>)> + 'a {
    let keys: BTreeSet<&'a str> = before
        .keys()
        .chain(after.keys())
        .map(String::as_str)
        .collect();
    keys.into_iter()
        .map(move |k| (k, before.get(k), after.get(k)))
}

fn render_arg(arg: &ArgDef) -> String {
    match &arg.default {
        Some(default) => format!("{} = {}", arg.ty, default),
        None => arg.ty.clone(),
    }
}

fn render_directive_args(args: &DirectiveArgs) -> String {
    let parts: Vec<String> = args.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("({})", parts.join(", "))
}

fn diff_directives(
    owner: &str,
    before: &BTreeMap<String, DirectiveArgs>,
    after: &BTreeMap<String, DirectiveArgs>,
    out: &mut Vec<DiffEntry>,
) {
    for (name, b, a) in zip_keys(before, after) {
        let path = format!("{}@{}", owner, name);
        match (b, a) {
            (None, Some(_)) => out.push(DiffEntry::added(DiffKind::DirectiveAdded, path)),
            (Some(_), None) => out.push(DiffEntry::removed(DiffKind::DirectiveRemoved, path)),
            (Some(b), Some(a)) if b != a => out.push(DiffEntry::changed(
                DiffKind::DirectiveChanged,
                path,
                render_directive_args(b),
                render_directive_args(a),
            )),
            _ => {}
        }
    }
}

fn diff_field(path: &str, before: &FieldDef, after: &FieldDef, out: &mut Vec<DiffEntry>) {
    if before.ty != after.ty {
        out.push(DiffEntry::changed(
            DiffKind::FieldChanged,
            path,
            &before.ty,
            &after.ty,
        ));
    }
    for (name, b, a) in zip_keys(&before.args, &after.args) {
        let arg_path = format!("{}.{}", path, name);
        match (b, a) {
            (None, Some(_)) => out.push(DiffEntry::added(DiffKind::ArgAdded, arg_path)),
            (Some(_), None) => out.push(DiffEntry::removed(DiffKind::ArgRemoved, arg_path)),
            (Some(b), Some(a)) if b.ty != a.ty || b.default != a.default => {
                out.push(DiffEntry::changed(
                    DiffKind::ArgChanged,
                    arg_path,
                    render_arg(b),
                    render_arg(a),
                ))
            }
            _ => {}
        }
    }
    diff_directives(path, &before.directives, &after.directives, out);
}

fn diff_type(name: &str, before: &TypeDef, after: &TypeDef, out: &mut Vec<DiffEntry>) {
    if before.kind != after.kind {
        out.push(DiffEntry::changed(
            DiffKind::TypeChanged,
            name,
            before.kind.as_str(),
            after.kind.as_str(),
        ));
    }
    for member in after.members.difference(&before.members) {
        out.push(DiffEntry::added(
            DiffKind::MemberAdded,
            format!("{}.{}", name, member),
        ));
    }
    for member in before.members.difference(&after.members) {
        out.push(DiffEntry::removed(
            DiffKind::MemberRemoved,
            format!("{}.{}", name, member),
        ));
    }
    for (field, b, a) in zip_keys(&before.fields, &after.fields) {
        let path = format!("{}.{}", name, field);
        match (b, a) {
            (None, Some(_)) => out.push(DiffEntry::added(DiffKind::FieldAdded, path)),
            (Some(_), None) => out.push(DiffEntry::removed(DiffKind::FieldRemoved, path)),
            (Some(b), Some(a)) => diff_field(&path, b, a, out),
            (None, None) => {}
        }
    }
    diff_directives(name, &before.directives, &after.directives, out);
}

/// Structural delta from `before` to `after`, sorted.
///
/// Descriptions are ignored. Comparing a snapshot with itself, or with any
/// structurally equal snapshot, yields no entries.
pub fn diff_snapshots(before: &SchemaSnapshot, after: &SchemaSnapshot) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    for (name, b, a) in zip_keys(before.types(), after.types()) {
        match (b, a) {
            (None, Some(_)) => out.push(DiffEntry::added(DiffKind::TypeAdded, name)),
            (Some(_), None) => out.push(DiffEntry::removed(DiffKind::TypeRemoved, name)),
            (Some(b), Some(a)) => diff_type(name, b, a, &mut out),
            (None, None) => {}
        }
    }
    out.sort();
    out
}

/// Fail unless `entries` is strictly increasing by (path, change, kind).
///
/// # Errors
///
/// `DeterminismViolation` naming the first offending path.
pub fn verify_ordering(entries: &[DiffEntry]) -> Result<(), ExError> {
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let in_order = (prev.path.as_str(), prev.change(), prev.kind)
            < (next.path.as_str(), next.change(), next.kind);
        if !in_order {
            return Err(ExError::new(ExErrorKind::DeterminismViolation)
                .with_op("compute_diff")
                .with_path(next.path.clone())
                .with_message(format!(
                    "diff entries out of order or duplicated: {:?} then {:?}",
                    prev.kind, next.kind
                )));
        }
    }
    Ok(())
}

/// Compute the structured diff between two snapshots.
///
/// # Errors
///
/// - `Serialization` when a snapshot digest cannot be computed
/// - `DeterminismViolation` when the sorted entries fail the ordering check
///   (should never occur in correct builds)
pub fn compute_diff(before: &SchemaSnapshot, after: &SchemaSnapshot) -> Result<SchemaDiff, ExError> {
    let identity = DiffIdentity {
        before_digest: before.digest()?,
        after_digest: after.digest()?,
    };

    // Fast path: same content digest
    if identity.before_digest == identity.after_digest {
        return Ok(SchemaDiff {
            diff_schema_version: 1,
            identity,
            classification: DiffClassification::Identical,
            entries: Vec::new(),
        });
    }

    let entries = diff_snapshots(before, after);
    verify_ordering(&entries)?;

    let classification = if entries.is_empty() {
        DiffClassification::NoStructuralChange
    } else {
        DiffClassification::Changed
    };

    Ok(SchemaDiff {
        diff_schema_version: 1,
        identity,
        classification,
        entries,
    })
}
