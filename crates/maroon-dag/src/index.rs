//! The per-file version index.
//!
//! # Invariants
//!
//! - `root` has no incoming edge.
//! - Every hash in any child list, and `root` itself, is a key of `children`.
//! - `head` is a key of `children`.
//! - Every `adopts` pair is also an edge in `children`.
//! - The graph is acyclic.

use std::collections::{BTreeMap, HashSet, VecDeque};

use maroon_types::ContentHash;
use tracing::debug;

use crate::edge::{Edge, EdgeKind};
use crate::error::{DagError, DagResult};

/// Version DAG of one tracked file.
///
/// Child lists keep insertion order: the order versions were discovered is
/// what rendering uses to lay siblings out reproducibly. The key map itself
/// is sorted so the persisted form is stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    pub(crate) root: ContentHash,
    pub(crate) head: ContentHash,
    pub(crate) adopts: Vec<(ContentHash, ContentHash)>,
    pub(crate) children: BTreeMap<ContentHash, Vec<ContentHash>>,
}

impl Index {
    /// Fresh single-node index for a file's first recorded content.
    pub fn build(initial_content: &[u8]) -> Self {
        Self::from_root(maroon_crypto::hash(initial_content))
    }

    /// Fresh single-node index rooted at an already-computed hash.
    pub fn from_root(root: ContentHash) -> Self {
        let mut children = BTreeMap::new();
        children.insert(root, Vec::new());
        Self {
            root,
            head: root,
            adopts: Vec::new(),
            children,
        }
    }

    pub fn root(&self) -> ContentHash {
        self.root
    }

    pub fn head(&self) -> ContentHash {
        self.head
    }

    /// Adopted edges in the order they were recorded.
    pub fn adopts(&self) -> &[(ContentHash, ContentHash)] {
        &self.adopts
    }

    /// Whether `hash` is a node.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.children.contains_key(hash)
    }

    /// Number of recorded versions.
    pub fn version_count(&self) -> usize {
        self.children.len()
    }

    /// All nodes, sorted by hash.
    pub fn nodes(&self) -> impl Iterator<Item = &ContentHash> {
        self.children.keys()
    }

    /// Children of a node in discovery order, or `None` if not a node.
    pub fn children_of(&self, hash: &ContentHash) -> Option<&[ContentHash]> {
        self.children.get(hash).map(Vec::as_slice)
    }

    /// Parents of a node. More than one only when an append reused an
    /// existing version as child.
    pub fn parents_of(&self, hash: &ContentHash) -> Vec<ContentHash> {
        self.children
            .iter()
            .filter(|(_, kids)| kids.contains(hash))
            .map(|(parent, _)| *parent)
            .collect()
    }

    /// Whether the edge `parent -> child` is flagged as adopted.
    pub fn is_adopted(&self, parent: &ContentHash, child: &ContentHash) -> bool {
        self.adopts.iter().any(|(p, c)| p == parent && c == child)
    }

    /// Every edge, parents in hash order and children in discovery order.
    pub fn edges(&self) -> Vec<Edge> {
        self.children
            .iter()
            .flat_map(|(parent, kids)| {
                kids.iter().map(move |child| Edge {
                    parent: *parent,
                    child: *child,
                    kind: if self.is_adopted(parent, child) {
                        EdgeKind::Adopted
                    } else {
                        EdgeKind::Organic
                    },
                })
            })
            .collect()
    }

    /// Nodes without children, sorted by hash.
    pub fn leaves(&self) -> Vec<ContentHash> {
        self.children
            .iter()
            .filter(|(_, kids)| kids.is_empty())
            .map(|(hash, _)| *hash)
            .collect()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Record `child` as a new version saved on top of `parent` and make it
    /// the head. This is the only way nodes enter the DAG.
    ///
    /// `child` may already be a node (the same content reached from a
    /// different version); it then gains a second parent. With `adopted`
    /// the edge is also flagged in `adopts`.
    ///
    /// Fails without modifying the index if `parent` is unknown, `child` is
    /// the root or `parent` itself, the edge already exists, or the edge
    /// would close a cycle.
    pub fn append(
        &mut self,
        parent: ContentHash,
        child: ContentHash,
        adopted: bool,
    ) -> DagResult<()> {
        let Some(siblings) = self.children.get(&parent) else {
            return Err(DagError::UnknownParent(parent));
        };
        if child == self.root {
            return Err(DagError::RootAsChild(child));
        }
        if child == parent {
            return Err(DagError::SelfEdge(child));
        }
        if siblings.contains(&child) {
            return Err(DagError::DuplicateEdge { parent, child });
        }
        if self.contains(&child) && self.reaches(&child, &parent) {
            return Err(DagError::CycleDetected(child));
        }

        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.push(child);
        }
        self.children.entry(child).or_default();
        self.head = child;
        if adopted {
            self.adopts.push((parent, child));
        }

        debug!(
            parent = %parent.short_hex(),
            child = %child.short_hex(),
            adopted,
            "appended version"
        );
        Ok(())
    }

    /// Move the head to an existing node. Edges are untouched.
    pub fn set_head(&mut self, hash: ContentHash) -> DagResult<()> {
        if !self.contains(&hash) {
            return Err(DagError::UnknownNode(hash));
        }
        debug!(from = %self.head.short_hex(), to = %hash.short_hex(), "moved head");
        self.head = hash;
        Ok(())
    }

    /// Whether `to` is reachable from `from` along forward edges.
    pub fn reaches(&self, from: &ContentHash, to: &ContentHash) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(*from);
        queue.push_back(*from);

        while let Some(current) = queue.pop_front() {
            for child in self.children.get(&current).into_iter().flatten() {
                if child == to {
                    return true;
                }
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
        false
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Check every structural invariant.
    ///
    /// Indexes built through `append`/`set_head` always pass; this exists
    /// for indexes decoded from disk.
    pub fn validate(&self) -> DagResult<()> {
        if !self.contains(&self.root) {
            return Err(DagError::Corrupt(format!("root {} is not a node", self.root)));
        }
        if !self.contains(&self.head) {
            return Err(DagError::Corrupt(format!("head {} is not a node", self.head)));
        }

        for (parent, kids) in &self.children {
            let mut seen = HashSet::new();
            for child in kids {
                if !self.contains(child) {
                    return Err(DagError::Corrupt(format!(
                        "{parent} lists child {child} which is not a node"
                    )));
                }
                if *child == self.root {
                    return Err(DagError::Corrupt(format!(
                        "root {} has incoming edge from {parent}",
                        self.root
                    )));
                }
                if !seen.insert(*child) {
                    return Err(DagError::Corrupt(format!(
                        "{parent} lists child {child} twice"
                    )));
                }
            }
        }

        for (parent, child) in &self.adopts {
            let present = self
                .children
                .get(parent)
                .is_some_and(|kids| kids.contains(child));
            if !present {
                return Err(DagError::Corrupt(format!(
                    "adopted edge {parent} -> {child} is not an edge"
                )));
            }
        }

        self.check_acyclic()
    }

    /// Kahn's algorithm over the whole key set.
    fn check_acyclic(&self) -> DagResult<()> {
        let mut in_degree: BTreeMap<ContentHash, usize> =
            self.children.keys().map(|h| (*h, 0)).collect();
        for kids in self.children.values() {
            for child in kids {
                if let Some(deg) = in_degree.get_mut(child) {
                    *deg += 1;
                }
            }
        }

        let mut queue: VecDeque<ContentHash> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(h, _)| *h)
            .collect();
        let mut visited = 0usize;

        while let Some(current) = queue.pop_front() {
            visited += 1;
            for child in self.children.get(&current).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(child) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if visited == self.children.len() {
            return Ok(());
        }
        let stuck = in_degree
            .into_iter()
            .find(|(_, deg)| *deg > 0)
            .map(|(h, _)| h)
            .unwrap_or(self.root);
        Err(DagError::CycleDetected(stuck))
    }
}
