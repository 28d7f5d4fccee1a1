//! Result formatter.
//!
//! Turns a loaded example and its diff into the record consumed by the
//! documentation renderer.

use crate::diff::{render_text, DiffEntry};
use crate::example::ExampleModule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Content language of the example source
pub const EXAMPLE_LANGUAGE: &str = "yaml";
/// Content language of the rendered delta
pub const RESULT_LANGUAGE: &str = "diff";

/// Display formatting for example sources
///
/// Implementations must not change meaning and should be idempotent.
pub trait Prettifier: Send + Sync {
    fn prettify(&self, path: &Path, text: &str) -> String;
}

impl<F> Prettifier for F
where
    F: Fn(&Path, &str) -> String + Send + Sync,
{
    fn prettify(&self, path: &Path, text: &str) -> String {
        self(path, text)
    }
}

/// Whitespace normalizer
///
/// Line endings always become `\n`. Trailing whitespace and blank lines at
/// the edges of the document are dropped only when the tidied text parses to
/// the same YAML value as the original; otherwise the line-ending-normalized
/// text is returned as is. Blank input becomes the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespacePrettifier;

impl Prettifier for WhitespacePrettifier {
    fn prettify(&self, _path: &Path, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let tidied = tidy(&normalized);
        if tidied.is_empty() || same_yaml(&normalized, &tidied) {
            tidied
        } else {
            normalized
        }
    }
}

fn tidy(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(str::trim_end).collect();
    let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);
    let mut out = lines[first..=last].join("\n");
    out.push('\n');
    out
}

fn same_yaml(a: &str, b: &str) -> bool {
    match (
        serde_yaml::from_str::<serde_yaml::Value>(a),
        serde_yaml::from_str::<serde_yaml::Value>(b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// The externally visible unit: one per example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleResult {
    pub example: String,
    pub example_language: String,
    pub result: String,
    pub result_language: String,
}

/// Build the record for `module` and its diff entries.
pub fn format_result(
    module: &ExampleModule,
    entries: &[DiffEntry],
    prettifier: &dyn Prettifier,
) -> ExampleResult {
    ExampleResult {
        example: prettifier.prettify(&module.path, &module.source),
        example_language: EXAMPLE_LANGUAGE.to_string(),
        result: render_text(entries),
        result_language: RESULT_LANGUAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffKind;
    use crate::loader::ExtensionObject;
    use std::path::PathBuf;

    fn pretty(text: &str) -> String {
        WhitespacePrettifier.prettify(Path::new("x.yaml"), text)
    }

    #[test]
    fn test_whitespace_prettifier_normalizes() {
        let input = "\r\n\nexports:\r\n  hooks: []   \n\n\n\n# end\t\n\n";
        assert_eq!(pretty(input), "exports:\n  hooks: []\n\n\n\n# end\n");
    }

    #[test]
    fn test_whitespace_prettifier_idempotent() {
        let inputs = [
            "a: 1\n\n\nb: 2 \t\n",
            "x: \"a\tb\"\r\ny: z",
            "",
            "   \n\t\n",
            "single",
            "keep: |+\n  text\n\n",
            "[unbalanced\n\n",
        ];
        for input in inputs {
            let once = pretty(input);
            assert_eq!(pretty(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_prettified_source_has_same_yaml_value() {
        let inputs = [
            "exports:\n  name: \"a\tb\"\n  description: |\n    first\n\n\n    second\n",
            "exports:\n  text: |\n    trailing   \n    kept\n",
            "exports:\n  text: |+\n    keep\n\n\n",
            "exports:\r\n  hooks: []  \r\n\r\n",
        ];
        for input in inputs {
            let original: serde_yaml::Value = serde_yaml::from_str(input).unwrap();
            let displayed: serde_yaml::Value = serde_yaml::from_str(&pretty(input)).unwrap();
            assert_eq!(original, displayed, "input {input:?}");
        }
    }

    #[test]
    fn test_tabs_and_inner_blank_lines_are_kept() {
        let input = "exports:\n  name: \"a\tb\"\n  description: |\n    first\n\n\n    second\n";
        assert_eq!(pretty(input), input);
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert_eq!(pretty(" \n\t\n\r\n"), "");
    }

    #[test]
    fn test_format_result() {
        let module = ExampleModule {
            id: "addPong".to_string(),
            path: PathBuf::from("/ex/addPongPlugin.yaml"),
            source: "exports:\n  hooks: []\n".to_string(),
            extension: ExtensionObject::new(
                serde_yaml::Value::Null,
                PathBuf::from("/ex/addPongPlugin.yaml"),
            ),
        };
        let entries = vec![DiffEntry::added(DiffKind::FieldAdded, "Query.pong")];
        let result = format_result(&module, &entries, &WhitespacePrettifier);
        assert_eq!(result.example_language, "yaml");
        assert_eq!(result.result_language, "diff");
        assert_eq!(result.result, "+ Query.pong\n");

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("exampleLanguage").is_some());
        assert!(json.get("resultLanguage").is_some());
    }

    #[test]
    fn test_closure_prettifier() {
        let upper = |_: &Path, text: &str| text.to_uppercase();
        assert_eq!(upper.prettify(Path::new("x"), "abc"), "ABC");
    }
}
