use maroon_types::ContentHash;
use serde::{Deserialize, Serialize};

/// How an edge came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Saved in the editor on top of the displayed version.
    Organic,
    /// Foreign content found on open and grafted under the stored head.
    Adopted,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organic => write!(f, "organic"),
            Self::Adopted => write!(f, "adopted"),
        }
    }
}

/// A forward edge of the version DAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub parent: ContentHash,
    pub child: ContentHash,
    pub kind: EdgeKind,
}
