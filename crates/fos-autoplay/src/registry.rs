//! Registered Set
//!
//! Identity-keyed set of elements already handed to the tracker. Entries
//! are generational `NodeId`s, which do not keep nodes alive; ids of
//! reclaimed nodes are swept the first time the set sees a newer GC epoch.

use std::collections::HashSet;

use fos_dom::{DomTree, NodeId};

/// Non-owning set of registered elements
#[derive(Debug, Default)]
pub struct RegisteredSet {
    members: HashSet<NodeId>,
    /// GC epoch of the tree at the last sweep
    epoch: u64,
}

impl RegisteredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Add an element; `false` if it was already present
    pub fn insert(&mut self, id: NodeId) -> bool {
        self.members.insert(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drop ids whose nodes were reclaimed since the last sweep
    ///
    /// Free unless the tree collected garbage in between.
    pub fn sweep(&mut self, tree: &DomTree) -> usize {
        if tree.gc_epoch() == self.epoch {
            return 0;
        }
        self.epoch = tree.gc_epoch();
        let before = self.members.len();
        self.members.retain(|&id| tree.is_alive(id));
        let dropped = before - self.members.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} reclaimed elements from registered set", dropped);
        }
        dropped
    }
}
