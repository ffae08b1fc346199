//! Content fingerprints and node construction.
//!
//! A fingerprint is the SHA-256 of the canonical JSON of a *hash input*: the
//! caller-chosen projection of a turn holding only the fields that decide
//! whether two turns are the same conversational state (e.g. which variables
//! are bound and which response was chosen). Variant payload such as the
//! literal wording stays in the node's data and out of the hash.
//!
//! What goes into the projection is the caller's policy. This module only
//! guarantees that structurally equal projections, in any key order, hash
//! identically.

use serde::Serialize;

use crate::canonical::{canonical_sha256_hex, CanonicalError};
use crate::types::{ContentHash, Node};

/// Error when a turn in a trace cannot be fingerprinted.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// The turn's hash input could not be canonically serialized.
    #[error("Failed to fingerprint turn {position}: {source}")]
    Turn {
        /// Zero-based position of the turn in its trace.
        position: usize,
        /// Underlying serialization failure.
        #[source]
        source: CanonicalError,
    },
}

/// Compute the content hash of a hash input.
pub fn content_hash<H: Serialize + ?Sized>(hash_input: &H) -> Result<ContentHash, CanonicalError> {
    canonical_sha256_hex(hash_input).map(ContentHash::new)
}

/// Wrap `data` in a node with a fresh id and the content hash of `hash_input`.
///
/// Two calls with structurally equal hash inputs yield equal hashes even when
/// `data` differs; that is what makes the nodes mergeable.
///
/// # Errors
/// Returns [`CanonicalError`] if `hash_input` cannot be serialized to JSON,
/// including when it holds a NaN or infinite float.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use trace_dedup_graph::make_node;
///
/// let a = make_node("hi there", &json!({"response": "greet", "slots": {}})).unwrap();
/// let b = make_node("hello!", &json!({"slots": {}, "response": "greet"})).unwrap();
/// assert_eq!(a.hash(), b.hash());
/// assert_ne!(a.id(), b.id());
/// ```
pub fn make_node<T, H: Serialize + ?Sized>(data: T, hash_input: &H) -> Result<Node<T>, CanonicalError> {
    let hash = content_hash(hash_input)?;
    Ok(Node::new(hash, data))
}

/// Projection of a turn onto its hash-relevant fields.
///
/// Implemented for any `Fn(&T) -> P` where `P: Serialize`, so a closure is
/// usually enough.
pub trait Fingerprint<T> {
    /// The serializable hash input.
    type Projection: Serialize;

    /// Project a turn onto the fields that participate in equality.
    fn hash_input(&self, turn: &T) -> Self::Projection;

    /// Build the node for a turn.
    fn node_for(&self, turn: T) -> Result<Node<T>, CanonicalError> {
        let input = self.hash_input(&turn);
        make_node(turn, &input)
    }
}

impl<T, P, F> Fingerprint<T> for F
where
    F: Fn(&T) -> P,
    P: Serialize,
{
    type Projection = P;

    fn hash_input(&self, turn: &T) -> P {
        self(turn)
    }
}
