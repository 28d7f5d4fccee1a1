//! Run configuration file
//!
//! ```yaml
//! baseline: schema/baseline.yaml
//! examples_dir: examples
//! parallel: true
//! strict: false
//! format: text
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub baseline: Option<PathBuf>,
    pub examples_dir: Option<PathBuf>,
    pub parallel: Option<bool>,
    pub strict: Option<bool>,
    pub format: Option<OutputFormat>,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        let mut config: RunConfig = serde_yaml::from_str(&text)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.baseline = config.baseline.map(|p| base.join(p));
        config.examples_dir = config.examples_dir.map(|p| base.join(p));
        Ok(config)
    }
}
