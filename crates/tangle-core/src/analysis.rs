use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::builder::ProjectIndex;
use crate::cycles::Cycle;
use crate::graph::{ClassGraph, PackageGraph};
use crate::types::{ClassMetrics, PackageName, QualifiedName, SimpleName};

/// Package graph and cycles for a package selection.
#[derive(Debug, Clone, Serialize)]
pub struct PackageAnalysis {
    pub selected: Vec<PackageName>,
    /// Project classes inside the selected packages.
    pub class_count: usize,
    /// Package graph restricted to the selection.
    pub graph: PackageGraph,
    /// Cycles reachable from the selection; may name unselected packages.
    pub cycles: Vec<Cycle<PackageName>>,
}

/// Class graph and cycles for a class selection.
#[derive(Debug, Clone, Serialize)]
pub struct ClassAnalysis {
    pub selected_count: usize,
    pub graph: ClassGraph,
    pub cycles: Vec<Cycle<SimpleName>>,
    /// Simple names shared by several selected classes.
    pub collisions: BTreeMap<SimpleName, Vec<QualifiedName>>,
}

/// Result of asking for one class's method metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    Found {
        source: PathBuf,
        metrics: ClassMetrics,
    },
    SourceNotFound {
        class: QualifiedName,
    },
    NoClassDeclaration {
        class: QualifiedName,
        source: PathBuf,
    },
}

impl ProjectIndex {
    pub fn analyze_packages<S: AsRef<str>>(&self, prefixes: &[S]) -> PackageAnalysis {
        let selected = self.select_packages(prefixes);
        let graph = self.package_subgraph(&selected);
        let cycles = self.package_cycles(&selected);
        let class_count = selected
            .iter()
            .filter_map(|package| self.classes_in(package))
            .map(|classes| classes.len())
            .sum();
        PackageAnalysis {
            selected: selected.into_iter().collect(),
            class_count,
            graph,
            cycles,
        }
    }

    pub fn analyze_classes<S: AsRef<str>>(&self, selectors: &[S]) -> ClassAnalysis {
        let selection = self.select_classes(selectors);
        let graph = self.class_graph(&selection);
        let cycles = ProjectIndex::class_cycles(&graph);
        ClassAnalysis {
            selected_count: selection.len(),
            collisions: self.simple_name_collisions(&selection),
            graph,
            cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ClassRegistry;
    use crate::builder::DependencyGraphBuilder;
    use crate::types::ClassDescriptor;

    fn index() -> ProjectIndex {
        let registry: ClassRegistry = [
            ("app.web.Controller", vec!["app.core.Service"]),
            ("app.core.Service", vec!["app.data.Repo"]),
            ("app.data.Repo", vec!["app.core.Service", "app.web.Controller"]),
            ("app.util.Strings", vec![]),
        ]
        .into_iter()
        .map(|(name, deps)| {
            ClassDescriptor::new(
                QualifiedName::new(name),
                deps.into_iter().map(QualifiedName::new).collect(),
            )
        })
        .collect();
        DependencyGraphBuilder::default().build(&registry)
    }

    #[test]
    fn test_analyze_all_packages() {
        let analysis = index().analyze_packages::<&str>(&[]);
        assert_eq!(analysis.selected.len(), 4);
        assert_eq!(analysis.class_count, 4);
        assert_eq!(analysis.cycles.len(), 1);
        assert_eq!(analysis.cycles[0].len(), 3);
    }

    #[test]
    fn test_analyze_package_selection() {
        let analysis = index().analyze_packages(&["app.util"]);
        assert_eq!(analysis.selected, vec![PackageName::new("app.util")]);
        assert_eq!(analysis.class_count, 1);
        assert!(analysis.cycles.is_empty());
        assert_eq!(analysis.graph.edge_count(), 0);
    }

    #[test]
    fn test_analyze_classes() {
        let analysis = index().analyze_classes(&["app.core", "app.data"]);
        assert_eq!(analysis.selected_count, 2);
        assert_eq!(analysis.graph.edge_count(), 2);
        assert_eq!(analysis.cycles.len(), 1);
        assert!(analysis.collisions.is_empty());
    }

    #[test]
    fn test_metrics_outcome_serializes_with_status() {
        let outcome = MetricsOutcome::SourceNotFound {
            class: QualifiedName::new("a.B"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "source_not_found");
        assert_eq!(json["class"], "a.B");
    }
}
