//! Deterministic traversals for rendering.
//!
//! Histories can be thousands of saves deep, so nothing here recurses: every
//! traversal keeps its own worklist.

use std::collections::{HashMap, HashSet, VecDeque};

use maroon_types::ContentHash;

use crate::index::Index;

impl Index {
    /// Depth-first preorder from the root, visiting children in discovery
    /// order. A node reachable through several parents appears once, at its
    /// first visit.
    pub fn walk(&self) -> Vec<ContentHash> {
        let mut order = Vec::with_capacity(self.children.len());
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            if let Some(kids) = self.children.get(&current) {
                // Reversed so the first-discovered child is popped first.
                for child in kids.iter().rev() {
                    if !visited.contains(child) {
                        stack.push(*child);
                    }
                }
            }
        }
        order
    }

    /// Depth of every node reachable from the root: the length of the
    /// shortest edge path from root (root is 0).
    pub fn depths(&self) -> HashMap<ContentHash, usize> {
        let mut depths = HashMap::new();
        let mut queue = VecDeque::new();
        depths.insert(self.root, 0);
        queue.push_back(self.root);

        while let Some(current) = queue.pop_front() {
            let depth = depths[&current];
            for child in self.children.get(&current).into_iter().flatten() {
                if !depths.contains_key(child) {
                    depths.insert(*child, depth + 1);
                    queue.push_back(*child);
                }
            }
        }
        depths
    }

    /// Shortest forward path from the root to `target`, both ends included.
    ///
    /// Returns `None` if `target` is not reachable from the root.
    pub fn lineage(&self, target: &ContentHash) -> Option<Vec<ContentHash>> {
        if !self.contains(target) {
            return None;
        }
        let mut predecessors: HashMap<ContentHash, ContentHash> = HashMap::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(self.root);
        queue.push_back(self.root);

        while let Some(current) = queue.pop_front() {
            if current == *target {
                let mut path = vec![current];
                let mut c = current;
                while let Some(prev) = predecessors.get(&c) {
                    path.push(*prev);
                    c = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for child in self.children.get(&current).into_iter().flatten() {
                if visited.insert(*child) {
                    predecessors.insert(*child, current);
                    queue.push_back(*child);
                }
            }
        }
        None
    }
}
