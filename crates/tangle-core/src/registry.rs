use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{ArtifactIndexer, ClassRegistry};
use crate::error::{ScanError, ScanResult};
use crate::types::{ClassDescriptor, PackageName, QualifiedName};

/// One class as written by an external scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: QualifiedName,
    #[serde(default)]
    pub package: Option<PackageName>,
    #[serde(default)]
    pub dependencies: BTreeSet<QualifiedName>,
}

impl From<RegistryEntry> for ClassDescriptor {
    fn from(entry: RegistryEntry) -> Self {
        let package = entry.package.unwrap_or_else(|| entry.name.package());
        ClassDescriptor {
            name: entry.name,
            package,
            dependencies: entry.dependencies,
        }
    }
}

/// Reads class registries from JSON files: an array of
/// `{ "name": "...", "package": "...", "dependencies": [...] }`.
#[derive(Debug, Default)]
pub struct RegistryFileIndexer;

impl RegistryFileIndexer {
    pub fn new() -> Self {
        Self
    }

    fn read_entries(path: &Path) -> ScanResult<Vec<RegistryEntry>> {
        if !path.exists() {
            return Err(ScanError::MissingPath(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| ScanError::Registry {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ArtifactIndexer for RegistryFileIndexer {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
    }

    fn index(&self, paths: &[PathBuf]) -> ScanResult<ClassRegistry> {
        let mut registry = ClassRegistry::new();
        for path in paths {
            let entries = Self::read_entries(path)?;
            debug!(path = %path.display(), classes = entries.len(), "read class registry");
            for entry in entries {
                registry.insert(entry.into());
            }
        }
        Ok(registry)
    }
}

/// Write a registry in the format [`RegistryFileIndexer`] reads.
pub fn write_registry(path: &Path, registry: &ClassRegistry) -> ScanResult<()> {
    let entries: Vec<RegistryEntry> = registry
        .iter()
        .map(|class| RegistryEntry {
            name: class.name.clone(),
            package: Some(class.package.clone()),
            dependencies: class.dependencies.clone(),
        })
        .collect();
    let content = serde_json::to_string_pretty(&entries).map_err(|source| ScanError::Registry {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|e| ScanError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_entries_and_derives_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "com.example.app.Main", "dependencies": ["com.example.core.Engine"]},
                {"name": "com.example.core.Engine", "package": "com.example.core"}
            ]"#,
        )
        .unwrap();

        let registry = RegistryFileIndexer::new().index(&[path]).unwrap();
        assert_eq!(registry.len(), 2);
        let main = registry.get(&QualifiedName::new("com.example.app.Main")).unwrap();
        assert_eq!(main.package, PackageName::new("com.example.app"));
        assert!(main
            .dependencies
            .contains(&QualifiedName::new("com.example.core.Engine")));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = RegistryFileIndexer::new()
            .index(&[PathBuf::from("/nonexistent/classes.json")])
            .unwrap_err();
        assert!(matches!(err, ScanError::MissingPath(_)));
    }

    #[test]
    fn test_malformed_registry_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = RegistryFileIndexer::new().index(&[path]).unwrap_err();
        assert!(matches!(err, ScanError::Registry { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let registry: ClassRegistry = [ClassDescriptor::new(
            QualifiedName::new("a.A"),
            [QualifiedName::new("b.B")].into_iter().collect(),
        )]
        .into_iter()
        .collect();

        write_registry(&path, &registry).unwrap();
        let reread = RegistryFileIndexer::new().index(&[path]).unwrap();
        assert_eq!(
            reread.get(&QualifiedName::new("a.A")),
            registry.get(&QualifiedName::new("a.A"))
        );
    }

    #[test]
    fn test_accepts_json_only() {
        let indexer = RegistryFileIndexer::new();
        assert!(indexer.accepts(Path::new("deps.json")));
        assert!(!indexer.accepts(Path::new("target/classes")));
    }
}
