//! Dependency graph and topological ordering.
//!
//! # Edge Direction
//!
//! An edge `start -> end` means "`start` requires `end`". The sort emits
//! `end` before `start`, so a file always follows everything it requires.
//!
//! Nodes are stored in an arena keyed by identity and reference their
//! neighbours by identity. Node iteration order is insertion order, which
//! keeps the sort deterministic.

use std::collections::HashMap;
use thiserror::Error;

/// Error from graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// Edges survived the sort, so at least one cycle exists
    #[error("Dependency graph has at least one cycle (involving {})", remaining.join(", "))]
    CycleDetected {
        /// Nodes still connected when the sort gave up
        remaining: Vec<String>,
    },
}

/// Construction input: `start` requires `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub start: String,
    pub end: String,
}

impl GraphEdge {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: end.into() }
    }
}

/// A node and the identities of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    id: String,
    outgoing: Vec<String>,
    incoming: Vec<String>,
}

impl GraphNode {
    fn new(id: String) -> Self {
        Self { id, outgoing: Vec::new(), incoming: Vec::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nodes this node requires, in insertion order.
    pub fn outgoing(&self) -> &[String] {
        &self.outgoing
    }

    /// Nodes requiring this node, in insertion order.
    pub fn incoming(&self) -> &[String] {
        &self.incoming
    }

    pub fn has_incoming_edge(&self) -> bool {
        !self.incoming.is_empty()
    }

    pub fn has_outgoing_edge(&self) -> bool {
        !self.outgoing.is_empty()
    }

    pub fn has_edge(&self) -> bool {
        self.has_incoming_edge() || self.has_outgoing_edge()
    }

    pub fn is_isolated(&self) -> bool {
        !self.has_edge()
    }

    fn add_outgoing(&mut self, id: &str) {
        if !self.outgoing.iter().any(|n| n == id) {
            self.outgoing.push(id.to_string());
        }
    }

    fn add_incoming(&mut self, id: &str) {
        if !self.incoming.iter().any(|n| n == id) {
            self.incoming.push(id.to_string());
        }
    }
}

/// Mutable directed graph of string-identified nodes.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, GraphNode>,
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from isolated nodes followed by edges.
    ///
    /// Isolated nodes are inserted first, in the given order; edge endpoints
    /// are created on demand in edge order.
    pub fn from_edges<I, S>(isolated: I, edges: &[GraphEdge]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for id in isolated {
            graph.add_node(id);
        }
        for edge in edges {
            graph.add_edge(&edge.start, &edge.end);
        }
        graph
    }

    /// Build a graph from `(node, requirements)` pairs.
    ///
    /// Nodes with no requirements are added as isolated nodes ahead of all
    /// edges.
    pub fn from_dependencies<'a, I>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])> + Clone,
    {
        let isolated = dependencies
            .clone()
            .into_iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.to_string());

        let edges: Vec<GraphEdge> = dependencies
            .into_iter()
            .flat_map(|(id, deps)| deps.iter().map(move |dep| GraphEdge::new(id, dep.as_str())))
            .collect();

        Self::from_edges(isolated, &edges)
    }

    /// Insert a node if it is not present yet.
    pub fn add_node(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.order.push(id.clone());
            self.nodes.insert(id.clone(), GraphNode::new(id));
        }
    }

    /// Add `start -> end`, creating missing endpoints. Duplicate edges are
    /// ignored.
    pub fn add_edge(&mut self, start: &str, end: &str) {
        self.add_node(start);
        self.add_node(end);
        if let Some(node) = self.nodes.get_mut(start) {
            node.add_outgoing(end);
        }
        if let Some(node) = self.nodes.get_mut(end) {
            node.add_incoming(start);
        }
    }

    /// Remove `start -> end`, then prune every node left without edges.
    ///
    /// Returns the pruned node ids in the order [`remove_isolated_nodes`]
    /// found them.
    ///
    /// [`remove_isolated_nodes`]: DependencyGraph::remove_isolated_nodes
    pub fn remove_edge(&mut self, start: &str, end: &str) -> Vec<String> {
        if let Some(node) = self.nodes.get_mut(end) {
            node.incoming.retain(|n| n != start);
        }
        if let Some(node) = self.nodes.get_mut(start) {
            node.outgoing.retain(|n| n != end);
        }
        self.remove_isolated_nodes()
    }

    /// Remove all nodes without edges, scanning in reverse graph order.
    pub fn remove_isolated_nodes(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .order
            .iter()
            .rev()
            .filter(|id| self.nodes.get(*id).is_some_and(GraphNode::is_isolated))
            .cloned()
            .collect();

        for id in &removed {
            self.nodes.remove(id);
        }
        self.order.retain(|id| self.nodes.contains_key(id));

        removed
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in graph order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether any node still has an edge.
    pub fn has_edge(&self) -> bool {
        self.nodes.values().any(GraphNode::has_edge)
    }

    /// Nodes nothing requires, in graph order.
    pub fn nodes_with_no_incoming_edge(&self) -> Vec<&str> {
        self.nodes().filter(|n| !n.has_incoming_edge()).map(GraphNode::id).collect()
    }

    fn first_without_incoming_edge(&self) -> Option<String> {
        self.nodes().find(|n| !n.has_incoming_edge()).map(|n| n.id.clone())
    }
}

/// Order the graph so every node comes after the nodes it requires.
///
/// Consumes the graph. Fails with [`GraphError::CycleDetected`] when edges
/// remain after no node without incoming edges is left.
pub fn topological_sort(mut graph: DependencyGraph) -> Result<Vec<String>, GraphError> {
    let mut sorted = graph.remove_isolated_nodes();

    while let Some(current) = graph.first_without_incoming_edge() {
        sorted.push(current.clone());

        let outgoing = graph.node(&current).map(|n| n.outgoing.clone()).unwrap_or_default();
        for end in outgoing.iter().rev() {
            let removed = graph.remove_edge(&current, end);
            sorted.extend(removed.into_iter().filter(|id| *id != current));
        }
    }

    if graph.has_edge() {
        let remaining = graph.nodes().map(|n| n.id.clone()).collect();
        return Err(GraphError::CycleDetected { remaining });
    }

    sorted.reverse();
    Ok(sorted)
}
