//! Incremental graph merger.
//!
//! Folds per-trace path graphs into one accumulator graph, collapsing nodes
//! whose content hashes are equal.
//!
//! ## Algorithm
//!
//! For each trace graph, in order, and each of its nodes in trace order:
//!
//! 1. Look the node's hash up in the accumulator (earlier traces) and then
//!    among the nodes this trace has already added (earlier in the trace).
//! 2. No match: the node is new and is kept.
//! 3. Match: the node is dropped, its id is redirected to the survivor, and
//!    the caller's merge callback folds its data into the survivor's data.
//!
//! Once every node is placed, the trace's edges are rebuilt through the
//! redirect table and appended. Edges are never deduplicated here; see
//! [`MergePolicy`] for opt-in cleanup when finishing.
//!
//! ## Invariants
//!
//! - No two accumulator nodes share a hash.
//! - Every accumulator edge resolves to accumulator nodes.
//! - The first occurrence of a hash survives; later occurrences only
//!   contribute through the merge callback. Topology and the set of hashes do
//!   not depend on trace order.
//!
//! Lookups go through a hash index, so folding is linear in the total number
//! of turns.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::policy::MergePolicy;
use crate::types::{ContentHash, Graph, Node, NodeId};

/// Boxed error returned by merge callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The caller's merge callback failed.
    #[error("Merge callback failed in trace {trace_index} for hash {hash}: {source}")]
    Callback {
        /// Index of the trace being folded (counting every fold attempt).
        trace_index: usize,
        /// Hash shared by the survivor and the incoming duplicate.
        hash: ContentHash,
        /// The callback's error.
        #[source]
        source: BoxError,
    },
}

/// Counters describing one or more folds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Traces folded successfully.
    pub traces: usize,
    /// Nodes that introduced a new hash.
    pub nodes_added: usize,
    /// Nodes collapsed into an existing survivor.
    pub nodes_merged: usize,
    /// Edges appended to the accumulator.
    pub edges_appended: usize,
}

impl MergeStats {
    fn absorb(&mut self, other: &MergeStats) {
        self.traces += other.traces;
        self.nodes_added += other.nodes_added;
        self.nodes_merged += other.nodes_merged;
        self.edges_appended += other.edges_appended;
    }
}

/// Accumulator that folds trace graphs one at a time.
///
/// Folding trace by trace lets callers catch a failing merge callback and
/// continue with the accumulator built from the traces that succeeded.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use trace_dedup_graph::{GraphMerger, Trace};
///
/// let state = |turn: &&str| json!({ "state": turn });
/// let first = Trace::new("first", vec!["greet", "ask_city"]).into_graph(&state).unwrap();
/// let second = Trace::new("second", vec!["greet", "ask_date"]).into_graph(&state).unwrap();
///
/// let mut merger = GraphMerger::new();
/// merger.fold(first, |_, _| Ok(())).unwrap();
/// merger.fold(second, |_, _| Ok(())).unwrap();
///
/// let graph = merger.finish();
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.num_edges(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GraphMerger<T> {
    graph: Graph<T>,
    /// Hash -> position of the survivor in `graph`'s node list.
    by_hash: HashMap<ContentHash, usize>,
    policy: MergePolicy,
    stats: MergeStats,
    attempts: usize,
}

impl<T> Default for GraphMerger<T> {
    fn default() -> Self {
        Self::with_policy(MergePolicy::default())
    }
}

impl<T> GraphMerger<T> {
    /// Create an empty merger with the default (edge-preserving) policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty merger with a custom policy.
    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            graph: Graph::new(),
            by_hash: HashMap::new(),
            policy,
            stats: MergeStats::default(),
            attempts: 0,
        }
    }

    /// Fold one trace graph into the accumulator.
    ///
    /// `merge` is called as `merge(survivor, incoming)` for every incoming
    /// node whose hash is already present; it should extend the survivor's
    /// data with whatever it needs from `incoming`. The survivor's id and
    /// hash are fixed. Callbacks should avoid duplicating content when the
    /// same data is merged twice.
    ///
    /// # Errors
    /// Returns [`MergeError::Callback`] if `merge` fails. The failing trace
    /// then adds no nodes and no edges, but survivors that were already
    /// extended by earlier callbacks for this trace stay extended.
    pub fn fold<F>(&mut self, trace: Graph<T>, mut merge: F) -> Result<MergeStats, MergeError>
    where
        F: FnMut(&mut Node<T>, Node<T>) -> Result<(), BoxError>,
    {
        let trace_index = self.attempts;
        self.attempts += 1;

        let (nodes, edges) = trace.into_parts();
        let mut staged: Vec<Node<T>> = Vec::new();
        let mut staged_by_hash: HashMap<ContentHash, usize> = HashMap::new();
        let mut redirect: HashMap<NodeId, NodeId> = HashMap::new();
        let mut stats = MergeStats {
            traces: 1,
            ..MergeStats::default()
        };

        for node in nodes {
            let survivor = match self.by_hash.get(node.hash()) {
                Some(&position) => self.graph.node_at_mut(position),
                None => match staged_by_hash.get(node.hash()) {
                    Some(&position) => staged.get_mut(position),
                    None => None,
                },
            };

            match survivor {
                Some(survivor) => {
                    tracing::trace!(
                        trace_index,
                        hash = %survivor.hash(),
                        survivor = %survivor.id(),
                        duplicate = %node.id(),
                        "collapsing duplicate node"
                    );
                    redirect.insert(node.id(), survivor.id());
                    merge(&mut *survivor, node).map_err(|source| MergeError::Callback {
                        trace_index,
                        hash: survivor.hash().clone(),
                        source,
                    })?;
                    stats.nodes_merged += 1;
                }
                None => {
                    staged_by_hash.insert(node.hash().clone(), staged.len());
                    staged.push(node);
                    stats.nodes_added += 1;
                }
            }
        }

        for node in staged {
            self.by_hash.insert(node.hash().clone(), self.graph.num_nodes());
            self.graph.push_node(node);
        }
        let first_new_edge = self.graph.num_edges();
        for edge in edges {
            self.graph
                .push_edge(edge.redirect(|id| redirect.get(&id).copied().unwrap_or(id)));
            stats.edges_appended += 1;
        }

        debug_assert!(
            self.graph.edges()[first_new_edge..]
                .iter()
                .all(|e| self.graph.contains(&e.from) && self.graph.contains(&e.to)),
            "merge left a dangling edge"
        );

        tracing::debug!(
            trace_index,
            nodes_added = stats.nodes_added,
            nodes_merged = stats.nodes_merged,
            edges_appended = stats.edges_appended,
            "folded trace"
        );

        self.stats.absorb(&stats);
        Ok(stats)
    }

    /// Fold several trace graphs in order, stopping at the first failure.
    pub fn fold_all<I, F>(&mut self, traces: I, mut merge: F) -> Result<MergeStats, MergeError>
    where
        I: IntoIterator<Item = Graph<T>>,
        F: FnMut(&mut Node<T>, Node<T>) -> Result<(), BoxError>,
    {
        let mut stats = MergeStats::default();
        for trace in traces {
            stats.absorb(&self.fold(trace, &mut merge)?);
        }
        Ok(stats)
    }

    /// The accumulator graph as folded so far.
    pub fn graph(&self) -> &Graph<T> {
        &self.graph
    }

    /// Totals over all successful folds.
    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    /// The policy applied when finishing.
    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Apply the policy's edge handling and return the merged graph.
    pub fn finish(self) -> Graph<T> {
        let mut graph = self.graph;

        if self.policy.rewrites_edges() {
            let before = graph.num_edges();
            let drop_self_loops = self.policy.drop_self_loops;
            let dedupe_edges = self.policy.dedupe_edges;
            let mut seen = HashSet::new();

            graph.retain_edges(|edge| {
                if drop_self_loops && edge.is_self_loop() {
                    return false;
                }
                !dedupe_edges || seen.insert(*edge)
            });

            tracing::debug!(
                policy = %self.policy.policy_id(),
                removed = before - graph.num_edges(),
                "applied edge policy"
            );
        }

        tracing::debug!(
            traces = self.stats.traces,
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "merge finished"
        );
        graph
    }
}

/// Fold every trace graph into one deduplicated graph, keeping all edges.
///
/// See [`GraphMerger::fold`] for the callback contract.
pub fn build_merged_graph<T, I, F>(traces: I, merge: F) -> Result<Graph<T>, MergeError>
where
    I: IntoIterator<Item = Graph<T>>,
    F: FnMut(&mut Node<T>, Node<T>) -> Result<(), BoxError>,
{
    build_merged_graph_with(MergePolicy::default(), traces, merge)
}

/// [`build_merged_graph`] with an explicit [`MergePolicy`].
pub fn build_merged_graph_with<T, I, F>(
    policy: MergePolicy,
    traces: I,
    merge: F,
) -> Result<Graph<T>, MergeError>
where
    I: IntoIterator<Item = Graph<T>>,
    F: FnMut(&mut Node<T>, Node<T>) -> Result<(), BoxError>,
{
    let mut merger = GraphMerger::with_policy(policy);
    merger.fold_all(traces, merge)?;
    Ok(merger.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trace;
    use serde_json::json;

    fn state(turn: &&'static str) -> serde_json::Value {
        json!({ "state": turn })
    }

    fn path(label: &str, turns: &[&'static str]) -> Graph<&'static str> {
        Trace::new(label, turns.to_vec()).into_graph(&state).unwrap()
    }

    fn keep(_: &mut Node<&'static str>, _: Node<&'static str>) -> Result<(), BoxError> {
        Ok(())
    }

    fn label_of(graph: &Graph<&'static str>, id: NodeId) -> String {
        graph.node(&id).map(|n| n.data().to_string()).unwrap_or_default()
    }

    #[test]
    fn test_shared_prefix_branches() {
        let graph = build_merged_graph(
            vec![path("t1", &["h1", "h2"]), path("t2", &["h1", "h3"])],
            keep,
        )
        .unwrap();

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 2);

        let mut pairs: Vec<(String, String)> = graph
            .edges()
            .iter()
            .map(|e| (label_of(&graph, e.from), label_of(&graph, e.to)))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("h1".to_string(), "h2".to_string()),
                ("h1".to_string(), "h3".to_string()),
            ]
        );
    }

    #[test]
    fn test_first_occurrence_survives() {
        let first = path("t1", &["a", "b"]);
        let survivor_id = first.nodes()[0].id();
        let second = path("t2", &["a", "c"]);

        let graph = build_merged_graph(vec![first, second], keep).unwrap();

        let a = graph.nodes().iter().find(|n| *n.data() == "a").unwrap();
        assert_eq!(a.id(), survivor_id);
        assert_eq!(graph.num_nodes(), 3);
    }

    #[test]
    fn test_repeat_within_trace_collapses() {
        let graph = build_merged_graph(vec![path("loop", &["a", "b", "a"])], keep).unwrap();

        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.num_edges(), 2);
        let a = graph.nodes()[0].id();
        let b = graph.nodes()[1].id();
        assert_eq!(graph.successors(&a), vec![b]);
        assert_eq!(graph.successors(&b), vec![a]);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_self_loop_is_kept_by_default() {
        let graph = build_merged_graph(vec![path("stutter", &["a", "a"])], keep).unwrap();

        assert_eq!(graph.num_nodes(), 1);
        assert_eq!(graph.num_edges(), 1);
        assert!(graph.edges()[0].is_self_loop());
    }

    #[test]
    fn test_parallel_edges_are_kept_by_default() {
        let graph = build_merged_graph(
            vec![path("t1", &["a", "b"]), path("t2", &["a", "b"])],
            keep,
        )
        .unwrap();

        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.edge_multiplicity().values().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_simple_graph_policy() {
        let graph = build_merged_graph_with(
            MergePolicy::simple_graph(),
            vec![path("t1", &["a", "b", "b"]), path("t2", &["a", "b"])],
            keep,
        )
        .unwrap();

        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.num_edges(), 1);
        assert!(!graph.edges()[0].is_self_loop());
    }

    #[test]
    fn test_merge_callback_receives_survivor_and_incoming() {
        let first = path("t1", &["h1", "h2"]);
        let second = path("t2", &["h1", "h3"]);
        let survivor_id = first.nodes()[0].id();
        let incoming_id = second.nodes()[0].id();

        let mut calls = Vec::new();
        build_merged_graph(vec![first, second], |survivor, incoming| {
            calls.push((survivor.id(), incoming.id()));
            Ok(())
        })
        .unwrap();

        assert_eq!(calls, vec![(survivor_id, incoming_id)]);
    }

    #[test]
    fn test_failed_fold_adds_nothing() {
        let mut merger = GraphMerger::new();
        merger.fold(path("t1", &["a", "b"]), keep).unwrap();

        let err = merger
            .fold(path("t2", &["x", "a", "y"]), |_, _| Err("boom".into()))
            .unwrap_err();
        match &err {
            MergeError::Callback { trace_index, .. } => assert_eq!(*trace_index, 1),
        }
        assert!(err.to_string().contains("boom"));

        assert_eq!(merger.graph().num_nodes(), 2);
        assert_eq!(merger.graph().num_edges(), 1);
        assert_eq!(merger.stats().traces, 1);

        // The accumulator keeps working after a failed trace
        let stats = merger.fold(path("t3", &["b", "c"]), keep).unwrap();
        assert_eq!(stats.nodes_added, 1);
        assert_eq!(stats.nodes_merged, 1);
        assert_eq!(merger.finish().num_nodes(), 3);
    }

    #[test]
    fn test_build_merged_graph_stops_at_failing_trace() {
        let first = path("t1", &["a", "b"]);
        let second = path("t2", &["x", "b"]);
        let third = path("t3", &["a", "c"]);
        let colliding = first.nodes()[1].hash().clone();

        let mut calls = 0;
        let err = build_merged_graph(vec![first, second, third], |_, _| {
            calls += 1;
            Err("conflicting phrasing".into())
        })
        .unwrap_err();

        match &err {
            MergeError::Callback { trace_index, hash, .. } => {
                assert_eq!(*trace_index, 1);
                assert_eq!(hash, &colliding);
            }
        }
        assert!(err.to_string().contains("conflicting phrasing"));
        // The third trace is never folded
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_fold_all_keeps_traces_before_failure() {
        let mut merger = GraphMerger::new();
        let err = merger
            .fold_all(
                vec![path("t1", &["a", "b"]), path("t2", &["b", "c"]), path("t3", &["d"])],
                |_, incoming| {
                    if *incoming.data() == "b" {
                        Err("rejected".into())
                    } else {
                        Ok(())
                    }
                },
            )
            .unwrap_err();

        assert!(matches!(err, MergeError::Callback { trace_index: 1, .. }));
        assert_eq!(merger.stats().traces, 1);
        assert_eq!(merger.graph().num_nodes(), 2);
        assert_eq!(merger.graph().num_edges(), 1);
        assert!(merger.graph().nodes().iter().all(|n| *n.data() != "d"));
    }

    #[test]
    fn test_reused_node_id_is_reported_by_validate() {
        let mut merger = GraphMerger::new();
        merger.fold(path("t1", &["a"]), keep).unwrap();
        let reused = merger.graph().nodes()[0].id();

        let hash = crate::content_hash(&json!({ "state": "z" })).unwrap();
        let impostor = Graph::from_parts(vec![Node::with_id(reused, hash, "z")], vec![]).unwrap();
        merger.fold(impostor, keep).unwrap();

        assert_eq!(
            merger.graph().validate(),
            Err(crate::types::GraphError::DuplicateNode(reused))
        );
    }

    #[test]
    fn test_stats_accumulate() {
        let mut merger = GraphMerger::new();
        let stats = merger
            .fold_all(
                vec![path("t1", &["a", "b", "c"]), path("t2", &["a", "b", "d"])],
                keep,
            )
            .unwrap();

        assert_eq!(
            stats,
            MergeStats {
                traces: 2,
                nodes_added: 4,
                nodes_merged: 2,
                edges_appended: 4,
            }
        );
        assert_eq!(merger.stats(), &stats);
    }

    #[test]
    fn test_empty_input() {
        let graph = build_merged_graph(Vec::<Graph<&'static str>>::new(), keep).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.num_edges(), 0);
    }
}
