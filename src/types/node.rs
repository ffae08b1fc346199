//! Node types for the trace graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt;

/// Unique identifier for a node in a trace graph.
///
/// Wraps a random UUID. Ids exist only to resolve edge endpoints and carry
/// no meaning: two runs over the same traces produce different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a NodeId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random NodeId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a NodeId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Content fingerprint of a node: SHA-256 hex of its canonical hash input.
///
/// Equal hashes mean "the same conversational state".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already computed hash string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A turn in the graph: a unique id, a content hash and the caller's payload.
///
/// `id` and `hash` are fixed at construction. Only `data` may change, when a
/// duplicate node is merged into this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node<T> {
    id: NodeId,
    hash: ContentHash,
    data: T,
}

impl<T> Node<T> {
    /// Create a node with a freshly generated id.
    ///
    /// Most callers want [`crate::make_node`], which derives `hash` from a
    /// hash-input projection.
    pub fn new(hash: ContentHash, data: T) -> Self {
        Self::with_id(NodeId::generate(), hash, data)
    }

    /// Create a node with an explicit id.
    pub fn with_id(id: NodeId, hash: ContentHash, data: T) -> Self {
        Self { id, hash, data }
    }

    /// The node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's content hash.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// The caller's payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable access to the payload, used by merge callbacks.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Consume the node, returning its payload.
    pub fn into_data(self) -> T {
        self.data
    }
}
