//! MergePolicy v1: post-merge edge handling.
//!
//! The default policy keeps every edge the merger produces, parallel edges
//! and self-loops included. Both switches are opt-in for consumers that
//! treat parallel edges as noise rather than as traversal frequency.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash_hex, CanonicalError};
use crate::DEFAULT_POLICY_VERSION;

/// Merge policy version 1.
///
/// ## Parameters
///
/// - `dedupe_edges`: Collapse parallel edges with the same (from, to) pair
/// - `drop_self_loops`: Discard edges whose endpoints are the same node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    /// Policy version identifier.
    pub version: String,
    /// Collapse parallel edges once all traces are folded.
    pub dedupe_edges: bool,
    /// Drop self-loops once all traces are folded.
    pub drop_self_loops: bool,
}

impl MergePolicy {
    /// Create a policy with custom parameters.
    pub fn new(dedupe_edges: bool, drop_self_loops: bool) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            dedupe_edges,
            drop_self_loops,
        }
    }

    /// Keep every edge, parallel edges and self-loops included.
    pub fn preserving() -> Self {
        Self::default()
    }

    /// Collapse parallel edges and drop self-loops.
    pub fn simple_graph() -> Self {
        Self::new(true, true)
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Compute a hash of the policy parameters for provenance.
    pub fn params_hash(&self) -> Result<String, CanonicalError> {
        canonical_hash_hex(self)
    }

    /// Whether finishing a merge needs an edge pass at all.
    pub(crate) fn rewrites_edges(&self) -> bool {
        self.dedupe_edges || self.drop_self_loops
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(false, false)
    }
}
