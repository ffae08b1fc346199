//! Trace linearization.
//!
//! Turns one recorded trace into a path graph: one node per turn and an edge
//! from every turn to the turn after it. No merging happens here, so a trace
//! that revisits a state still gets two distinct nodes.

use crate::canonical::CanonicalError;
use crate::fingerprint::{Fingerprint, FingerprintError};
use crate::types::{Edge, Graph, Node, Trace};

/// Build a path graph from ordered turns.
///
/// `to_node` is called once per turn, in order. For `n` turns the result has
/// `n` nodes and `n - 1` edges (none for zero or one turn).
///
/// # Errors
/// Returns [`FingerprintError::Turn`] with the turn's position if `to_node`
/// fails; no partial graph is returned.
pub fn linearize<T, I, F>(turns: I, mut to_node: F) -> Result<Graph<T>, FingerprintError>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Result<Node<T>, CanonicalError>,
{
    let mut graph = Graph::new();
    let mut previous = None;

    for (position, turn) in turns.into_iter().enumerate() {
        let node = to_node(turn).map_err(|source| FingerprintError::Turn { position, source })?;
        let id = node.id();
        if let Some(prev) = previous {
            graph.push_edge(Edge::new(prev, id));
        }
        graph.push_node(node);
        previous = Some(id);
    }

    Ok(graph)
}

impl<T> Trace<T> {
    /// Linearize this trace, fingerprinting each turn with `fingerprint`.
    pub fn into_graph<P: Fingerprint<T>>(self, fingerprint: &P) -> Result<Graph<T>, FingerprintError> {
        let label = self.label;
        let graph = linearize(self.turns, |turn| fingerprint.node_for(turn))?;
        tracing::debug!(
            trace = %label,
            turns = graph.num_nodes(),
            "linearized trace"
        );
        Ok(graph)
    }
}
