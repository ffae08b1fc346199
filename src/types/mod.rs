//! Core types for the trace graph.

pub mod node;
pub mod edge;
pub mod graph;
pub mod trace;

pub use node::{NodeId, ContentHash, Node};
pub use edge::Edge;
pub use graph::{Graph, GraphError};
pub use trace::Trace;
