//! Id-free graph shape for comparing merge results.
//!
//! Node ids are random, so two merges of the same traces never agree on ids.
//! A `GraphShape` describes a graph purely by content hashes: the set of
//! distinct node hashes and the multiset of (from-hash, to-hash) edge pairs.
//! Merging the same traces in any order yields equal shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::canonical::{canonical_hash_hex, CanonicalError};
use crate::types::{ContentHash, Graph};
use crate::GRAPH_SCHEMA_VERSION;

/// Hash-level description of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphShape {
    /// Fingerprint of the whole shape (xxh64 of the components).
    pub shape_id: String,
    /// Distinct node hashes, sorted.
    pub hashes: BTreeSet<ContentHash>,
    /// Number of nodes, counting duplicates.
    pub node_count: u64,
    /// Edge endpoints as hash pairs, sorted, parallel edges repeated.
    pub edge_pairs: Vec<(ContentHash, ContentHash)>,
}

/// Internal struct for computing shape_id hash.
#[derive(Serialize)]
struct ShapeIdInput<'a> {
    schema_version: &'a str,
    node_count: u64,
    hashes: &'a BTreeSet<ContentHash>,
    edge_pairs: &'a [(ContentHash, ContentHash)],
}

impl GraphShape {
    /// Compute the shape of a graph.
    ///
    /// Edges with an endpoint missing from the graph are skipped; a graph that
    /// passes [`Graph::validate`] has none.
    pub fn of<T>(graph: &Graph<T>) -> Result<Self, CanonicalError> {
        let hashes: BTreeSet<ContentHash> = graph.nodes().iter().map(|n| n.hash().clone()).collect();
        let node_count = graph.num_nodes() as u64;

        let mut edge_pairs: Vec<(ContentHash, ContentHash)> = graph
            .edges()
            .iter()
            .filter_map(|e| {
                let from = graph.node(&e.from)?;
                let to = graph.node(&e.to)?;
                Some((from.hash().clone(), to.hash().clone()))
            })
            .collect();
        edge_pairs.sort();

        let shape_id = canonical_hash_hex(&ShapeIdInput {
            schema_version: GRAPH_SCHEMA_VERSION,
            node_count,
            hashes: &hashes,
            edge_pairs: &edge_pairs,
        })?;

        Ok(Self {
            shape_id,
            hashes,
            node_count,
            edge_pairs,
        })
    }

    /// Whether every node hash in the graph is distinct.
    pub fn is_deduplicated(&self) -> bool {
        self.hashes.len() as u64 == self.node_count
    }

    /// Verify that this shape matches the given graph.
    pub fn verify<T>(&self, graph: &Graph<T>) -> Result<bool, CanonicalError> {
        Ok(Self::of(graph)?.shape_id == self.shape_id)
    }
}
