//! Non-deduplicating graph union.

use crate::types::Graph;

/// Concatenate graphs without comparing hashes.
///
/// Nodes and edges are appended in input order. Meant for traces already
/// known to be disjoint, or as a first step before a caller-specific merge.
///
/// Inputs should have disjoint node ids. Ids are not compared here, so
/// passing the same graph twice (or a clone of it) yields repeated ids,
/// which [`Graph::validate`] reports as [`GraphError::DuplicateNode`].
///
/// [`GraphError::DuplicateNode`]: crate::GraphError::DuplicateNode
pub fn union_graphs<T, I>(graphs: I) -> Graph<T>
where
    I: IntoIterator<Item = Graph<T>>,
{
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for graph in graphs {
        let (n, e) = graph.into_parts();
        nodes.extend(n);
        edges.extend(e);
    }
    Graph::from_parts_unchecked(nodes, edges)
}
