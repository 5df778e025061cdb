//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree with generational node handles.
//!
//! A [`NodeId`] never owns the node it names. When a detached subtree is
//! reclaimed by [`DomTree::collect_garbage`] its arena slots are recycled
//! under a new generation, so stale ids simply stop resolving.

mod node;
mod tree;
mod document;
mod geometry;
mod observer;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Descendants};
pub use document::Document;
pub use geometry::DOMRect;
pub use observer::{
    MutationType, MutationRecord, MutationObserverInit, MutationObserver, ObserverId,
};

/// Node identifier (arena index + slot generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId {
        index: u32::MAX,
        generation: 0,
    };

    /// Build an id from its raw parts
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Check that this is not the `NONE` sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    NotFound(NodeId),

    #[error("cannot insert {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}
