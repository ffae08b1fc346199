//! # trace-dedup-graph
//!
//! Fold independently recorded conversation traces into one shared turn graph.
//!
//! Each trace is a linear sequence of turns. Turns whose content fingerprints
//! are equal represent the same conversational state and collapse into a
//! single node, so traces sharing a prefix branch where they diverge.
//!
//! ## Core Contract
//!
//! 1. The caller projects each turn onto its hash-relevant fields; the
//!    SHA-256 of the canonical JSON of that projection is the node's hash
//! 2. Each trace is linearized into a path graph
//! 3. Path graphs are folded into an accumulator, collapsing equal hashes and
//!    merging payloads through a caller-supplied callback
//!
//! ## Architecture
//!
//! ```text
//! Trace → Fingerprint → linearize → Graph ─┬→ GraphMerger → Graph (deduplicated)
//!                                          └→ union_graphs → Graph (concatenated)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Structurally equal hash inputs produce equal hashes, whatever the key order
//! - The merged graph's hash set and edge pairs do not depend on trace order
//! - Node ids are random; compare graphs with [`GraphShape`], never by id

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod canonical;
pub mod fingerprint;
pub mod linearize;
pub mod merge;
pub mod policy;
pub mod union;
pub mod shape;

// Re-exports
pub use types::{NodeId, ContentHash, Node, Edge, Graph, GraphError, Trace};
pub use canonical::{to_canonical_bytes, canonical_sha256_hex, canonical_hash, canonical_hash_hex, CanonicalError};
pub use fingerprint::{make_node, content_hash, Fingerprint, FingerprintError};
pub use linearize::linearize;
pub use merge::{GraphMerger, MergeError, MergeStats, BoxError, build_merged_graph, build_merged_graph_with};
pub use policy::MergePolicy;
pub use union::union_graphs;
pub use shape::GraphShape;

/// Schema version for graph shapes.
/// Increment on breaking changes to hashing or shape layout.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0.0";

/// Default merge policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "merge_policy_v1";
