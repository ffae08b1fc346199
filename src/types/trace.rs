//! Recorded traces.

use serde::{Deserialize, Serialize};

/// One recorded conversation: an ordered list of turns with a readable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace<T> {
    /// Human-readable label (e.g. the recording's name).
    pub label: String,
    /// Turns in the order they occurred.
    pub turns: Vec<T>,
}

impl<T> Trace<T> {
    /// Create a new trace.
    pub fn new(label: impl Into<String>, turns: Vec<T>) -> Self {
        Self {
            label: label.into(),
            turns,
        }
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the trace has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
