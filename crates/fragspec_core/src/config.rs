//! Repository layout configuration.
//!
//! A [`RepoLayout`] is passed explicitly to every bundle and sync call, so one
//! process can work on several base directories side by side.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FragError, FragResult};

/// Name of the optional per-repository configuration file.
pub const CONFIG_FILE: &str = "fragspec.toml";

/// Locations of the root document and fragment trees under a base directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepoLayout {
    /// Base directory everything else is relative to
    #[serde(skip)]
    pub base_dir: PathBuf,
    /// Root document file name
    pub main_file: String,
    /// Directory holding one fragment per API path
    pub paths_dir: String,
    /// Directory holding one fragment per schema definition
    pub definitions_dir: String,
    /// Directory holding `<language>/<encoded-path>/<verb>.<ext>` samples
    pub code_samples_dir: String,
    /// Glob selecting fragment files inside the paths and definitions trees
    pub fragment_pattern: String,
    /// Character substituted for `/` when a path becomes a file name
    pub separator: char,
}

impl Default for RepoLayout {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("spec"),
            main_file: "swagger.yaml".to_string(),
            paths_dir: "paths".to_string(),
            definitions_dir: "definitions".to_string(),
            code_samples_dir: "code_samples".to_string(),
            fragment_pattern: "**/*.yaml".to_string(),
            separator: '@',
        }
    }
}

impl RepoLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Build a layout for `base_dir`, applying `fragspec.toml` when present.
    pub fn load(base_dir: impl Into<PathBuf>) -> FragResult<Self> {
        let base_dir = base_dir.into();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut layout = if config_path.is_file() {
            debug!("Reading layout from {:?}", config_path);
            let content =
                fs::read_to_string(&config_path).map_err(|e| FragError::io(&config_path, e))?;
            toml::from_str::<RepoLayout>(&content)?
        } else {
            RepoLayout::default()
        };
        layout.base_dir = base_dir;
        layout.validate()?;
        Ok(layout)
    }

    pub fn with_main_file(mut self, name: impl Into<String>) -> Self {
        self.main_file = name.into();
        self
    }

    pub fn with_fragment_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.fragment_pattern = pattern.into();
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Check the layout describes a usable tree.
    pub fn validate(&self) -> FragResult<()> {
        if self.separator == '/' || self.separator == '\\' {
            return Err(FragError::InvalidConfig(format!(
                "separator '{}' is a path separator",
                self.separator
            )));
        }
        if self.main_file.is_empty() {
            return Err(FragError::InvalidConfig("main_file cannot be empty".into()));
        }
        glob::Pattern::new(&self.fragment_pattern).map_err(|e| FragError::InvalidPattern {
            pattern: self.fragment_pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn main_file_path(&self) -> PathBuf {
        self.base_dir.join(&self.main_file)
    }

    pub fn paths_dir(&self) -> PathBuf {
        self.base_dir.join(&self.paths_dir)
    }

    pub fn definitions_dir(&self) -> PathBuf {
        self.base_dir.join(&self.definitions_dir)
    }

    pub fn code_samples_dir(&self) -> PathBuf {
        self.base_dir.join(&self.code_samples_dir)
    }
}
