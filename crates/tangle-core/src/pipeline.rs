use std::path::PathBuf;

use tracing::{debug, info};

use crate::analyzer::{ArtifactIndexer, ClassRegistry};
use crate::builder::{DependencyGraphBuilder, ProjectIndex};
use crate::config::Config;
use crate::error::{ScanError, ScanResult};

/// Runs the indexers over a classpath and builds the project index.
///
/// Every call rescans from scratch.
pub struct ScanPipeline {
    indexers: Vec<Box<dyn ArtifactIndexer>>,
    builder: DependencyGraphBuilder,
}

impl ScanPipeline {
    pub fn new(indexers: Vec<Box<dyn ArtifactIndexer>>, config: &Config) -> Self {
        Self {
            indexers,
            builder: DependencyGraphBuilder::new(config.scan.namespace_filter()),
        }
    }

    /// Index every path in classpath order. Each path goes to the first
    /// indexer that accepts it; a class seen earlier shadows later copies.
    pub fn scan(&self, paths: &[PathBuf]) -> ScanResult<ClassRegistry> {
        let mut registry = ClassRegistry::new();

        for path in paths {
            if !path.exists() {
                return Err(ScanError::MissingPath(path.clone()));
            }
            let indexer = self
                .indexers
                .iter()
                .find(|indexer| indexer.accepts(path))
                .ok_or_else(|| ScanError::UnsupportedArtifact(path.clone()))?;

            let found = indexer.index(std::slice::from_ref(path))?;
            debug!(
                indexer = indexer.name(),
                path = %path.display(),
                classes = found.len(),
                "indexed artifact"
            );

            let mut shadowed = 0usize;
            for class in found.iter() {
                if !registry.insert(class.clone()) {
                    shadowed += 1;
                }
            }
            if shadowed > 0 {
                debug!(path = %path.display(), shadowed, "classes shadowed by earlier entries");
            }
        }

        info!(artifacts = paths.len(), classes = registry.len(), "scan complete");
        Ok(registry)
    }

    /// Scan and build the package graph in one step.
    pub fn analyze(&self, paths: &[PathBuf]) -> ScanResult<ProjectIndex> {
        let registry = self.scan(paths)?;
        Ok(self.builder.build(&registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryFileIndexer;
    use crate::types::{PackageName, QualifiedName};

    fn pipeline() -> ScanPipeline {
        ScanPipeline::new(vec![Box::new(RegistryFileIndexer::new())], &Config::default())
    }

    #[test]
    fn test_earlier_path_shadows_later() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        std::fs::write(&first, r#"[{"name": "a.A", "dependencies": ["b.B"]}]"#).unwrap();
        std::fs::write(
            &second,
            r#"[{"name": "a.A", "dependencies": []}, {"name": "b.B"}]"#,
        )
        .unwrap();

        let registry = pipeline().scan(&[first, second]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry
                .get(&QualifiedName::new("a.A"))
                .unwrap()
                .dependencies
                .len(),
            1
        );
    }

    #[test]
    fn test_analyze_builds_package_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        std::fs::write(
            &path,
            r#"[{"name": "a.A", "dependencies": ["b.B", "java.util.Map"]}, {"name": "b.B"}]"#,
        )
        .unwrap();

        let index = pipeline().analyze(&[path]).unwrap();
        assert!(index
            .package_graph()
            .has_edge(&PackageName::new("a"), &PackageName::new("b")));
        assert_eq!(index.package_graph().edge_count(), 1);
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let err = pipeline()
            .scan(&[PathBuf::from("/nonexistent/classes.json")])
            .unwrap_err();
        assert!(matches!(err, ScanError::MissingPath(_)));
    }

    #[test]
    fn test_path_no_indexer_accepts_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline().scan(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedArtifact(_)));
    }
}
