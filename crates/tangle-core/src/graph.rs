use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{PackageName, SimpleName};

/// Package-level dependency graph.
pub type PackageGraph = DependencyGraph<PackageName>;

/// Class-level dependency graph keyed by simple class names.
pub type ClassGraph = DependencyGraph<SimpleName>;

/// Directed graph stored as node -> set of successors.
///
/// Edges are set-valued, so adding the same edge twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "N: Serialize + Ord",
    deserialize = "N: Deserialize<'de> + Ord"
))]
pub struct DependencyGraph<N> {
    adjacency: BTreeMap<N, BTreeSet<N>>,
}

impl<N: Ord + Clone> DependencyGraph<N> {
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    /// Add a node with no edges if it is not already present.
    pub fn add_node(&mut self, node: N) {
        self.adjacency.entry(node).or_default();
    }

    /// Add an edge. The source becomes a node; the target does not.
    pub fn add_edge(&mut self, from: N, to: N) {
        self.adjacency.entry(from).or_default().insert(to);
    }

    pub fn contains_node(&self, node: &N) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn has_edge(&self, from: &N, to: &N) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// The graph's own copy of `node`, if present.
    pub fn node_ref(&self, node: &N) -> Option<&N> {
        self.adjacency.get_key_value(node).map(|(key, _)| key)
    }

    /// Successors of `node`, or `None` if it is not a node of this graph.
    pub fn successors(&self, node: &N) -> Option<&BTreeSet<N>> {
        self.adjacency.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.adjacency.keys()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> {
        self.adjacency
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Copy of this graph restricted to nodes accepted by `keep`.
    ///
    /// Edges survive only if both endpoints are kept.
    pub fn retain_nodes(&self, keep: impl Fn(&N) -> bool) -> Self {
        let adjacency = self
            .adjacency
            .iter()
            .filter(|(node, _)| keep(node))
            .map(|(node, targets)| {
                let targets = targets.iter().filter(|t| keep(t)).cloned().collect();
                (node.clone(), targets)
            })
            .collect();
        Self { adjacency }
    }
}

impl<N: Ord + Clone> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Ord + Clone> FromIterator<(N, N)> for DependencyGraph<N> {
    fn from_iter<I: IntoIterator<Item = (N, N)>>(iter: I) -> Self {
        let mut graph = Self::new();
        for (from, to) in iter {
            graph.add_edge(from, to);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(&"a", &"b"));
        assert!(!graph.has_edge(&"b", &"a"));
    }

    #[test]
    fn test_edge_target_is_not_a_node() {
        let graph: DependencyGraph<&str> = [("a", "b")].into_iter().collect();
        assert!(graph.contains_node(&"a"));
        assert!(!graph.contains_node(&"b"));
        assert!(graph.successors(&"b").is_none());
    }

    #[test]
    fn test_no_duplicate_nodes() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a");
        graph.add_edge("a", "b");
        graph.add_node("a");
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.successors(&"a").map(BTreeSet::len), Some(1));
    }

    #[test]
    fn test_retain_nodes_drops_dangling_edges() {
        let graph: DependencyGraph<&str> = [("a", "b"), ("b", "c"), ("c", "a")]
            .into_iter()
            .collect();
        let kept = graph.retain_nodes(|n| *n != "c");
        assert_eq!(kept.node_count(), 2);
        assert_eq!(kept.edges().collect::<Vec<_>>(), vec![(&"a", &"b")]);
    }

    #[test]
    fn test_serializes_as_adjacency_map() {
        let graph: DependencyGraph<String> = [("a".to_string(), "b".to_string())]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json, serde_json::json!({ "a": ["b"] }));
    }
}
