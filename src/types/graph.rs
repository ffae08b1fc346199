//! The graph container shared by linearization, merging and union.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::edge::Edge;
use super::node::{ContentHash, Node, NodeId};

/// Integrity violation in a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two nodes share an id.
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),
    /// An edge endpoint is not a member of the graph.
    #[error("Dangling edge {from} -> {to}: endpoint {missing} is not in the graph")]
    DanglingEdge {
        /// Edge source.
        from: NodeId,
        /// Edge target.
        to: NodeId,
        /// The endpoint that could not be resolved.
        missing: NodeId,
    },
}

/// A directed multigraph of turns.
///
/// Nodes are unique by id and kept in insertion order. The one way to break
/// that is [`union_graphs`](crate::union_graphs) over inputs that share ids,
/// which [`Graph::validate`] detects. Edges reference nodes
/// by id; parallel edges and self-loops are allowed.
#[derive(Debug, Clone, Serialize)]
pub struct Graph<T> {
    nodes: Vec<Node<T>>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Graph<T> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes and edges, checking integrity.
    ///
    /// Fails on duplicate node ids or edges whose endpoints are not among `nodes`.
    pub fn from_parts(nodes: Vec<Node<T>>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            if graph.index.contains_key(&node.id()) {
                return Err(GraphError::DuplicateNode(node.id()));
            }
            graph.push_node(node);
        }
        graph.edges = edges;
        graph.validate()?;
        Ok(graph)
    }

    /// Build a graph without integrity checks.
    ///
    /// Used by union, whose output is a plain concatenation. If ids repeat,
    /// lookups by id resolve to the last node with that id and
    /// [`validate`](Self::validate) reports the duplicate.
    pub(crate) fn from_parts_unchecked(nodes: Vec<Node<T>>, edges: Vec<Edge>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();
        Self { nodes, edges, index }
    }

    pub(crate) fn push_node(&mut self, node: Node<T>) {
        self.index.insert(node.id(), self.nodes.len());
        self.nodes.push(node);
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub(crate) fn node_at_mut(&mut self, position: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(position)
    }

    pub(crate) fn retain_edges(&mut self, keep: impl FnMut(&Edge) -> bool) {
        self.edges.retain(keep);
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Consume the graph, returning its nodes and edges.
    pub fn into_parts(self) -> (Vec<Node<T>>, Vec<Edge>) {
        (self.nodes, self.edges)
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, counting parallel edges separately.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node with this id is present.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node<T>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Look up the first node carrying `hash`.
    pub fn node_by_hash(&self, hash: &ContentHash) -> Option<&Node<T>> {
        self.nodes.iter().find(|n| n.hash() == hash)
    }

    /// Content hashes of all nodes, in node order.
    pub fn hashes(&self) -> Vec<&ContentHash> {
        self.nodes.iter().map(|n| n.hash()).collect()
    }

    /// Targets of edges leaving `id`, one entry per edge.
    pub fn successors(&self, id: &NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.from == *id)
            .map(|e| e.to)
            .collect()
    }

    /// Sources of edges entering `id`, one entry per edge.
    pub fn predecessors(&self, id: &NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.to == *id)
            .map(|e| e.from)
            .collect()
    }

    /// Count of parallel edges per (from, to) pair.
    ///
    /// For consumers that read parallel edges as traversal frequency.
    pub fn edge_multiplicity(&self) -> BTreeMap<Edge, usize> {
        let mut counts: BTreeMap<Edge, usize> = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(*edge).or_default() += 1;
        }
        counts
    }

    /// Edges with at least one endpoint missing from the graph.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| !self.contains(&e.from) || !self.contains(&e.to))
            .collect()
    }

    /// Check that node ids are unique and every edge endpoint resolves to a
    /// node in this graph.
    ///
    /// Graphs built by [`from_parts`](Self::from_parts), linearization and
    /// merging always pass; a union of graphs that share node ids does not.
    pub fn validate(&self) -> Result<(), GraphError> {
        // The index holds one entry per distinct id
        if self.index.len() != self.nodes.len() {
            let mut seen = HashSet::with_capacity(self.nodes.len());
            if let Some(node) = self.nodes.iter().find(|n| !seen.insert(n.id())) {
                return Err(GraphError::DuplicateNode(node.id()));
            }
        }
        if let Some(edge) = self.dangling_edges().first() {
            let missing = if self.contains(&edge.from) { edge.to } else { edge.from };
            return Err(GraphError::DanglingEdge {
                from: edge.from,
                to: edge.to,
                missing,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(hash: &str) -> Node<&'static str> {
        Node::new(ContentHash::from(hash), "turn")
    }

    #[test]
    fn test_from_parts_accepts_valid_graph() {
        let a = node("a");
        let b = node("b");
        let edge = Edge::new(a.id(), b.id());

        let graph = Graph::from_parts(vec![a, b], vec![edge]).unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.num_edges(), 1);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_from_parts_rejects_duplicate_id() {
        let a = node("a");
        let twin = Node::with_id(a.id(), ContentHash::from("other"), "turn");
        let id = a.id();

        let err = Graph::from_parts(vec![a, twin], vec![]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode(id));
    }

    #[test]
    fn test_validate_reports_duplicate_id() {
        let a = node("a");
        let b = node("b");
        let twin = Node::with_id(a.id(), ContentHash::from("a"), "again");
        let id = a.id();

        let graph = Graph::from_parts_unchecked(vec![a, b, twin], vec![]);
        assert_eq!(graph.validate(), Err(GraphError::DuplicateNode(id)));
    }

    #[test]
    fn test_from_parts_rejects_dangling_edge() {
        let a = node("a");
        let ghost = NodeId::generate();
        let edge = Edge::new(a.id(), ghost);

        match Graph::from_parts(vec![a], vec![edge]).unwrap_err() {
            GraphError::DanglingEdge { missing, .. } => assert_eq!(missing, ghost),
            other => panic!("Expected DanglingEdge, got {other:?}"),
        }
    }

    #[test]
    fn test_neighbors_and_multiplicity() {
        let a = node("a");
        let b = node("b");
        let c = node("c");
        let (ia, ib, ic) = (a.id(), b.id(), c.id());
        let edges = vec![Edge::new(ia, ib), Edge::new(ia, ib), Edge::new(ia, ic)];

        let graph = Graph::from_parts(vec![a, b, c], edges).unwrap();

        assert_eq!(graph.successors(&ia), vec![ib, ib, ic]);
        assert_eq!(graph.predecessors(&ic), vec![ia]);
        assert!(graph.predecessors(&ia).is_empty());

        let counts = graph.edge_multiplicity();
        assert_eq!(counts[&Edge::new(ia, ib)], 2);
        assert_eq!(counts[&Edge::new(ia, ic)], 1);
    }

    #[test]
    fn test_lookup_by_id_and_hash() {
        let a = node("a");
        let id = a.id();
        let graph = Graph::from_parts(vec![a, node("b")], vec![]).unwrap();

        assert_eq!(graph.node(&id).map(|n| n.hash().as_str()), Some("a"));
        assert!(graph.node(&NodeId::generate()).is_none());
        assert_eq!(graph.node_by_hash(&ContentHash::from("b")).map(|n| *n.data()), Some("turn"));
        assert_eq!(graph.hashes().len(), 2);
    }
}
