//! Edge types for the trace graph.

use serde::{Deserialize, Serialize};
use super::node::NodeId;

/// Edge in the trace graph.
///
/// A value record: "turn `to` immediately follows turn `from` in at least one
/// recorded trace". Edges are rebuilt rather than mutated when a duplicate
/// node is collapsed. Parallel edges are legitimate and are kept.
///
/// Implements `Ord` for deterministic ordering: (from, to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Predecessor node (source).
    pub from: NodeId,
    /// Successor node (target).
    pub to: NodeId,
}

impl Edge {
    /// Create a new edge.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }

    /// Whether the edge points a node at itself.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Rebuild the edge with both endpoints passed through `resolve`.
    pub fn redirect(&self, mut resolve: impl FnMut(NodeId) -> NodeId) -> Self {
        Self::new(resolve(self.from), resolve(self.to))
    }
}

// Canonical ordering: from, then to
impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.from
            .cmp(&other.from)
            .then_with(|| self.to.cmp(&other.to))
    }
}
