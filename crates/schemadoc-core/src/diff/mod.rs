//! Schema diff engine.
//!
//! Compares two schema snapshots and produces a structured, deterministic
//! delta plus its compact text rendering.
//!
//! ## Entry point
//!
//! ```ignore
//! use schemadoc_core::diff::{compute_diff, render_text};
//!
//! let diff = compute_diff(&baseline, &modified)?;
//! let text = render_text(&diff.entries);
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce byte-identical output.
//! - **Order independence**: declaration order in the source documents is
//!   never observable.
//! - **Descriptions ignored**: only structure is compared.

pub mod engine;
pub mod model;
pub mod render;

pub use engine::{compute_diff, diff_snapshots};
pub use model::{ChangeKind, DiffClassification, DiffEntry, DiffKind, SchemaDiff};
pub use render::{render_summary, render_text};
