use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A saved project: the artifacts to scan and where their sources live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub artifact_paths: Vec<PathBuf>,
    #[serde(default)]
    pub source_paths: Vec<PathBuf>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an artifact path unless it is already listed.
    pub fn add_artifact_path(&mut self, path: PathBuf) {
        if !self.artifact_paths.contains(&path) {
            self.artifact_paths.push(path);
        }
    }

    pub fn remove_artifact_path(&mut self, path: &Path) {
        self.artifact_paths.retain(|p| p != path);
    }

    /// Add a source root unless it is already listed.
    pub fn add_source_path(&mut self, path: PathBuf) {
        if !self.source_paths.contains(&path) {
            self.source_paths.push(path);
        }
    }

    pub fn remove_source_path(&mut self, path: &Path) {
        self.source_paths.retain(|p| p != path);
    }

    /// Load a project descriptor from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read project file '{}'", path.display()))?;
        let project: Project = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse project file '{}'", path.display()))?;
        Ok(project)
    }

    /// Save this descriptor as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize project")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write project file '{}'", path.display()))?;
        Ok(())
    }

    /// Copy with relative paths joined onto `base` (usually the descriptor's
    /// directory).
    pub fn resolved(&self, base: &Path) -> Self {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            name: self.name.clone(),
            artifact_paths: self.artifact_paths.iter().map(resolve).collect(),
            source_paths: self.source_paths.iter().map(resolve).collect(),
        }
    }
}
