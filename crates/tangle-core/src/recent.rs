use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default number of remembered projects.
pub const DEFAULT_MAX_RECENT: usize = 10;

/// Recently opened project files, most recent first.
///
/// Backed by an explicit file; callers decide where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProjects {
    #[serde(default)]
    entries: Vec<PathBuf>,
    #[serde(skip, default = "default_max")]
    max_entries: usize,
}

fn default_max() -> usize {
    DEFAULT_MAX_RECENT
}

impl RecentProjects {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Load the list from `path`. A missing file is an empty list.
    pub fn load(path: &Path, max_entries: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(max_entries));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recent projects '{}'", path.display()))?;
        let mut recent: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse recent projects '{}'", path.display()))?;
        recent.max_entries = max_entries;
        recent.entries.truncate(max_entries);
        Ok(recent)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize recent projects")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write recent projects '{}'", path.display()))?;
        Ok(())
    }

    /// Move `project` to the front, dropping the oldest entry past the cap.
    pub fn touch(&mut self, project: &Path) {
        self.entries.retain(|p| p != project);
        self.entries.insert(0, project.to_path_buf());
        self.entries.truncate(self.max_entries);
    }

    /// Remove `project`. Returns true if it was listed.
    pub fn forget(&mut self, project: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p != project);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

impl Default for RecentProjects {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECENT)
    }
}
