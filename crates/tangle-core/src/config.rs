use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::filter::{NamespaceFilter, DEFAULT_EXCLUDED_PREFIXES};
use crate::recent::DEFAULT_MAX_RECENT;

/// File name searched for in the project directory and its ancestors.
pub const CONFIG_FILE: &str = ".tangle.toml";

/// Top-level configuration from `.tangle.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub recent: RecentConfig,
}

/// Which namespaces count as part of the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

fn default_excluded_prefixes() -> Vec<String> {
    DEFAULT_EXCLUDED_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

impl ScanConfig {
    pub fn namespace_filter(&self) -> NamespaceFilter {
        NamespaceFilter::new(self.excluded_prefixes.iter().cloned())
    }
}

/// Where the recent-project list is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_RECENT
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            file: None,
            max_entries: default_max_entries(),
        }
    }
}

impl Config {
    /// Load configuration from a `.tangle.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `tangle init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.tangle.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults."
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `tangle init`.
    pub fn default_toml() -> String {
        r#"# tangle - dependency cycle analysis configuration

[scan]
# Classes and packages starting with any of these prefixes are treated as
# platform code and left out of every graph.
excluded_prefixes = ["java.", "javax.", "sun.", "com.sun."]

[recent]
# file = "/home/me/.tangle-recent.json"
max_entries = 10
"#
        .to_string()
    }
}
