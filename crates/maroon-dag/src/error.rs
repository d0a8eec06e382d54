//! Error types for the version DAG.

use maroon_types::ContentHash;

/// Errors that can occur during DAG operations.
///
/// The transition errors (`UnknownParent` through `CycleDetected`) mean the
/// caller broke the index contract; `Corrupt` and `Serialization` come from
/// decoding a persisted index.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// Append named a parent that is not a node.
    #[error("unknown parent: {0}")]
    UnknownParent(ContentHash),

    /// A referenced node was not found in the DAG.
    #[error("node not found: {0}")]
    UnknownNode(ContentHash),

    /// Nothing may point at the root.
    #[error("edge into root {0}")]
    RootAsChild(ContentHash),

    /// A node cannot be its own child.
    #[error("self edge on {0}")]
    SelfEdge(ContentHash),

    /// The edge is already present.
    #[error("duplicate edge {parent} -> {child}")]
    DuplicateEdge {
        parent: ContentHash,
        child: ContentHash,
    },

    /// The edge would close a cycle.
    #[error("cycle detected involving node {0}")]
    CycleDetected(ContentHash),

    /// A decoded index violates a structural invariant.
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DagError {
    /// `true` for errors raised by `append`/`set_head` on a bad request.
    pub fn is_transition(&self) -> bool {
        !matches!(self, Self::Corrupt(_) | Self::Serialization(_))
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
