//! Cycle detection with Tarjan's strongly-connected-components algorithm.
//!
//! The traversal keeps its own frame stack instead of recursing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// Nodes of one strongly connected component, in stack pop order.
///
/// Either two or more nodes, or a single node with an edge to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle<N>(pub Vec<N>);

impl<N: PartialEq> Cycle<N> {
    pub fn nodes(&self) -> &[N] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, node: &N) -> bool {
        self.0.contains(node)
    }
}

/// Finds cycles in a borrowed graph.
///
/// Algorithm state is created per call.
pub struct CycleDetector<'g, N> {
    graph: &'g DependencyGraph<N>,
}

impl<'g, N: Ord + Clone + std::hash::Hash> CycleDetector<'g, N> {
    pub fn new(graph: &'g DependencyGraph<N>) -> Self {
        Self { graph }
    }

    /// Find every cycle, starting traversals from all graph nodes.
    pub fn find_cycles(&self) -> Vec<Cycle<N>> {
        self.find_cycles_from(self.graph.nodes())
    }

    /// Find cycles reachable from `roots`.
    ///
    /// Roots only pick where a traversal starts. Once started, a traversal
    /// follows every edge of the full graph, so nodes outside `roots` can end
    /// up in a reported cycle. Roots that are not graph nodes are skipped.
    pub fn find_cycles_from<'r, I>(&self, roots: I) -> Vec<Cycle<N>>
    where
        I: IntoIterator<Item = &'r N>,
        N: 'r,
    {
        let mut state = TarjanState::new(self.graph);
        for root in roots {
            let Some(root) = self.graph.node_ref(root) else {
                continue;
            };
            if !state.index.contains_key(root) {
                state.strong_connect(root);
            }
        }

        state
            .components
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => self.graph.has_edge(single, single),
                _ => true,
            })
            .map(Cycle)
            .collect()
    }
}

/// One suspended visit: the node and how far through its successors it got.
struct Frame<'g, N> {
    node: &'g N,
    successors: Vec<&'g N>,
    next: usize,
}

/// Per-call algorithm state.
struct TarjanState<'g, N> {
    graph: &'g DependencyGraph<N>,
    counter: usize,
    index: HashMap<&'g N, usize>,
    low_link: HashMap<&'g N, usize>,
    stack: Vec<&'g N>,
    on_stack: HashSet<&'g N>,
    components: Vec<Vec<N>>,
}

impl<'g, N: Ord + Clone + std::hash::Hash> TarjanState<'g, N> {
    fn new(graph: &'g DependencyGraph<N>) -> Self {
        Self {
            graph,
            counter: 0,
            index: HashMap::new(),
            low_link: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            components: Vec::new(),
        }
    }

    /// Assign discovery index and low-link, push onto the open stack.
    fn open(&mut self, node: &'g N) -> Frame<'g, N> {
        self.index.insert(node, self.counter);
        self.low_link.insert(node, self.counter);
        self.counter += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let successors = self
            .graph
            .successors(node)
            .map(|targets| targets.iter().collect())
            .unwrap_or_default();
        Frame {
            node,
            successors,
            next: 0,
        }
    }

    fn lower(&mut self, node: &'g N, candidate: usize) {
        if let Some(low) = self.low_link.get_mut(node) {
            *low = (*low).min(candidate);
        }
    }

    fn strong_connect(&mut self, root: &'g N) {
        let mut frames = vec![self.open(root)];

        while let Some(frame) = frames.last_mut() {
            if frame.next < frame.successors.len() {
                let node = frame.node;
                let successor = frame.successors[frame.next];
                frame.next += 1;

                if !self.index.contains_key(successor) {
                    let child = self.open(successor);
                    frames.push(child);
                } else if self.on_stack.contains(successor) {
                    let successor_index = self.index[successor];
                    self.lower(node, successor_index);
                }
                continue;
            }

            let node = frame.node;
            frames.pop();

            let node_low = self.low_link[node];
            if let Some(parent) = frames.last() {
                let parent = parent.node;
                self.lower(parent, node_low);
            }
            if node_low == self.index[node] {
                self.close_component(node);
            }
        }
    }

    /// Pop the stack down to and including `root` as one component.
    fn close_component(&mut self, root: &'g N) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(member);
            component.push(member.clone());
            if member == root {
                break;
            }
        }
        self.components.push(component);
    }
}
