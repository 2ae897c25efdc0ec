use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::analyzer::ClassRegistry;
use crate::cycles::{Cycle, CycleDetector};
use crate::filter::NamespaceFilter;
use crate::graph::{ClassGraph, PackageGraph};
use crate::types::{ClassDescriptor, PackageName, QualifiedName, SimpleName};

/// Set of classes chosen for class-level analysis.
pub type ClassSelection = BTreeSet<QualifiedName>;

/// Builds a [`ProjectIndex`] from an indexer's registry.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    filter: NamespaceFilter,
}

impl DependencyGraphBuilder {
    pub fn new(filter: NamespaceFilter) -> Self {
        Self { filter }
    }

    fn in_scope(&self, name: &QualifiedName, package: &PackageName) -> bool {
        self.filter.is_project(name.as_str()) && self.filter.is_project(package.as_str())
    }

    /// Filter the registry to project classes and aggregate the package graph.
    pub fn build(&self, registry: &ClassRegistry) -> ProjectIndex {
        let mut classes = BTreeMap::new();
        let mut package_graph = PackageGraph::new();
        let mut package_contents: BTreeMap<PackageName, BTreeSet<QualifiedName>> =
            BTreeMap::new();

        for class in registry.iter() {
            if !self.in_scope(&class.name, &class.package) {
                continue;
            }

            package_contents
                .entry(class.package.clone())
                .or_default()
                .insert(class.name.clone());
            package_graph.add_node(class.package.clone());

            for dependency in &class.dependencies {
                let target = registry
                    .get(dependency)
                    .map(|d| d.package.clone())
                    .unwrap_or_else(|| dependency.package());
                if self.in_scope(dependency, &target) && target != class.package {
                    package_graph.add_edge(class.package.clone(), target);
                }
            }

            classes.insert(class.name.clone(), class.clone());
        }

        debug!(
            classes = classes.len(),
            packages = package_graph.node_count(),
            edges = package_graph.edge_count(),
            "built package graph"
        );

        ProjectIndex {
            classes,
            package_graph,
            package_contents,
        }
    }
}

/// Project classes plus the package graph built from them.
///
/// Class graphs are derived on demand for a selection.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectIndex {
    classes: BTreeMap<QualifiedName, ClassDescriptor>,
    package_graph: PackageGraph,
    package_contents: BTreeMap<PackageName, BTreeSet<QualifiedName>>,
}

impl ProjectIndex {
    pub fn package_graph(&self) -> &PackageGraph {
        &self.package_graph
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageName> {
        self.package_contents.keys()
    }

    pub fn classes_in(&self, package: &PackageName) -> Option<&BTreeSet<QualifiedName>> {
        self.package_contents.get(package)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Packages equal to or nested below any prefix. No prefixes selects all.
    pub fn select_packages<S: AsRef<str>>(&self, prefixes: &[S]) -> BTreeSet<PackageName> {
        self.packages()
            .filter(|package| {
                prefixes.is_empty() || prefixes.iter().any(|p| package.is_within(p.as_ref()))
            })
            .cloned()
            .collect()
    }

    /// Classes named exactly by a selector, plus every class of packages a
    /// selector covers. No selectors selects every project class.
    pub fn select_classes<S: AsRef<str>>(&self, selectors: &[S]) -> ClassSelection {
        if selectors.is_empty() {
            return self.classes.keys().cloned().collect();
        }

        let mut selection = ClassSelection::new();
        for selector in selectors {
            let selector = selector.as_ref();
            let exact = QualifiedName::new(selector);
            if self.classes.contains_key(&exact) {
                selection.insert(exact);
            }
            for (package, members) in &self.package_contents {
                if package.is_within(selector) {
                    selection.extend(members.iter().cloned());
                }
            }
        }
        selection
    }

    /// Package graph restricted to `selected`, for display.
    pub fn package_subgraph(&self, selected: &BTreeSet<PackageName>) -> PackageGraph {
        self.package_graph.retain_nodes(|p| selected.contains(p))
    }

    /// Cycles found by traversals started at the selected packages.
    ///
    /// Traversal follows the full package graph, so a cycle may include
    /// packages outside the selection.
    pub fn package_cycles(&self, selected: &BTreeSet<PackageName>) -> Vec<Cycle<PackageName>> {
        CycleDetector::new(&self.package_graph).find_cycles_from(selected)
    }

    /// Class graph over simple names for the selected classes.
    ///
    /// Self-references and references from a nested type to its directly
    /// enclosing type are dropped.
    pub fn class_graph(&self, selection: &ClassSelection) -> ClassGraph {
        let mut graph = ClassGraph::new();

        for name in selection {
            let Some(class) = self.classes.get(name) else {
                continue;
            };
            let source = class.name.simple_name();
            graph.add_node(source.clone());

            for dependency in &class.dependencies {
                if !selection.contains(dependency) {
                    continue;
                }
                let target = dependency.simple_name();
                if source == target || source.enclosing() == Some(target.as_str()) {
                    continue;
                }
                graph.add_edge(source.clone(), target);
            }
        }

        debug!(
            selected = selection.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built class graph"
        );
        graph
    }

    /// Every cycle of a class graph.
    pub fn class_cycles(graph: &ClassGraph) -> Vec<Cycle<SimpleName>> {
        CycleDetector::new(graph).find_cycles()
    }

    /// Simple names shared by more than one selected class. These classes
    /// share a single class-graph node.
    pub fn simple_name_collisions(
        &self,
        selection: &ClassSelection,
    ) -> BTreeMap<SimpleName, Vec<QualifiedName>> {
        let mut by_simple: BTreeMap<SimpleName, Vec<QualifiedName>> = BTreeMap::new();
        for name in selection.iter().filter(|n| self.classes.contains_key(*n)) {
            by_simple
                .entry(name.simple_name())
                .or_default()
                .push(name.clone());
        }
        by_simple.retain(|_, names| names.len() > 1);
        by_simple
    }
}
