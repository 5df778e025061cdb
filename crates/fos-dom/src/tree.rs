//! DOM Tree (arena-based allocation)
//!
//! Slots carry a generation that is bumped whenever the slot is reclaimed,
//! so a `NodeId` acts as a weak handle: it resolves while its node lives and
//! never aliases whatever later reuses the slot.

use fos_media::HTMLMediaElement;

use crate::observer::{MutationObserver, MutationObserverInit, MutationRecord, ObserverId};
use crate::{DOMRect, DomError, Node, NodeData, NodeId};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: NodeId,
    live: usize,
    gc_epoch: u64,
    observers: Vec<MutationObserver>,
    next_observer: u64,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::NONE,
            live: 0,
            gc_epoch: 0,
            observers: Vec::new(),
            next_observer: 1,
        };
        tree.root = tree.alloc(Node::document());
        tree
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::from_raw_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::from_raw_parts(index, 0)
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Check that `id` still names a node that has not been reclaimed
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Bumped every time `collect_garbage` reclaims at least one node
    pub fn gc_epoch(&self) -> u64 {
        self.gc_epoch
    }

    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        self.alloc(Node::element(local_name))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    /// Parent of a node, if it has one
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Inclusive ancestor chain, starting at `id`
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(node) = self.get(current) {
            chain.push(current);
            current = node.parent;
        }
        chain
    }

    /// Check whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(node) = self.get(current) {
            if current == self.root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or at the end)
    ///
    /// A child that already has a parent is moved, producing a removal
    /// record on its old parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_node = self.node(parent)?;
        let accepts_children =
            matches!(parent_node.data, NodeData::Document | NodeData::Element(_));
        self.node(child)?;
        if !accepts_children || child == self.root || self.ancestors(parent).contains(&child) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == child {
                return Ok(());
            }
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let prev = match reference {
            Some(r) => self.node(r)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };
        let next = reference.unwrap_or(NodeId::NONE);

        {
            let c = self.node_mut(child)?;
            c.parent = parent;
            c.prev_sibling = prev;
            c.next_sibling = next;
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = child;
        } else {
            self.node_mut(parent)?.last_child = child;
        }

        self.notify(MutationRecord::child_list(
            parent,
            vec![child],
            Vec::new(),
            prev.is_valid().then_some(prev),
            next.is_valid().then_some(next),
        ));
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// The subtree stays alive (and its ids valid) until the next
    /// `collect_garbage`, so it can still be re-inserted.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        let (prev, next) = {
            let c = self.node(child)?;
            if c.parent != parent {
                return Err(DomError::NotAChild { parent, child });
            }
            (c.prev_sibling, c.next_sibling)
        };

        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        {
            let c = self.node_mut(child)?;
            c.parent = NodeId::NONE;
            c.prev_sibling = NodeId::NONE;
            c.next_sibling = NodeId::NONE;
        }

        self.notify(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![child],
            prev.is_valid().then_some(prev),
            next.is_valid().then_some(next),
        ));
        Ok(child)
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let old = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotFound(id))?
            .set_attr(name, value);
        self.notify(MutationRecord::attribute(id, name, old));
        Ok(())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Pre-order walk over every descendant of `id` (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            scope: id,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Record the layout box of a node
    pub fn set_layout_rect(&mut self, id: NodeId, rect: DOMRect) -> Result<(), DomError> {
        self.node_mut(id)?.layout = Some(rect);
        Ok(())
    }

    /// Drop the layout box (e.g. `display: none`)
    pub fn clear_layout_rect(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node_mut(id)?.layout = None;
        Ok(())
    }

    pub fn layout_rect(&self, id: NodeId) -> Option<DOMRect> {
        self.get(id).and_then(|n| n.layout)
    }

    /// Media state of a `video`/`audio` element
    pub fn media(&self, id: NodeId) -> Option<&HTMLMediaElement> {
        self.get(id)?.as_element()?.media.as_ref()
    }

    pub fn media_mut(&mut self, id: NodeId) -> Option<&mut HTMLMediaElement> {
        self.get_mut(id)?.as_element_mut()?.media.as_mut()
    }

    /// Reclaim every node that is no longer connected to the document.
    ///
    /// Returns the number of reclaimed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        let mut reachable = vec![false; self.slots.len()];
        reachable[self.root.index() as usize] = true;
        for id in self.descendants(self.root) {
            reachable[id.index() as usize] = true;
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.is_some() && !reachable[index] {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
                freed += 1;
            }
        }

        if freed > 0 {
            self.live -= freed;
            self.gc_epoch += 1;
            tracing::debug!("Reclaimed {} detached nodes (epoch {})", freed, self.gc_epoch);
        }
        freed
    }

    /// Create a mutation observer on this tree
    pub fn create_observer(&mut self) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(MutationObserver::new(id));
        id
    }

    /// Start observing `target` with `observer`
    pub fn observe(
        &mut self,
        observer: ObserverId,
        target: NodeId,
        options: MutationObserverInit,
    ) -> Result<(), DomError> {
        self.node(target)?;
        if let Some(o) = self.observers.iter_mut().find(|o| o.id() == observer) {
            o.observe(target, options);
        }
        Ok(())
    }

    /// Drain the records queued for `observer`
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .find(|o| o.id() == observer)
            .map(MutationObserver::take_records)
            .unwrap_or_default()
    }

    /// Remove an observer and its pending records
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|o| o.id() != observer);
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(MutationObserver::has_pending)
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let ancestors = self.ancestors(record.target);
        for observer in &mut self.observers {
            observer.record(&record, &ancestors);
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over the descendants of a node
pub struct Descendants<'a> {
    tree: &'a DomTree,
    scope: NodeId,
    next: NodeId,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.tree.get(id)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut current = id;
            loop {
                if current == self.scope {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(current) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                current = n.parent;
            }
        };
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_chain(depth: usize) -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let mut chain = vec![tree.root()];
        for _ in 0..depth {
            let el = tree.create_element("div");
            tree.append_child(*chain.last().unwrap(), el).unwrap();
            chain.push(el);
        }
        (tree, chain)
    }

    #[test]
    fn test_append_and_children_order() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, c).unwrap();
        tree.insert_before(root, b, Some(c)).unwrap();

        let ids: Vec<_> = tree.children(root).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("a");
        let a1 = tree.create_element("a1");
        let b = tree.create_element("b");
        tree.append_child(root, a).unwrap();
        tree.append_child(a, a1).unwrap();
        tree.append_child(root, b).unwrap();

        let ids: Vec<_> = tree.descendants(root).collect();
        assert_eq!(ids, vec![a, a1, b]);
        let scoped: Vec<_> = tree.descendants(a).collect();
        assert_eq!(scoped, vec![a1]);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, chain) = tree_with_chain(3);
        let err = tree.append_child(chain[3], chain[1]).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("hi");
        let el = tree.create_element("span");
        assert!(tree.append_child(text, el).is_err());
    }

    #[test]
    fn test_remove_then_gc_invalidates_id() {
        let (mut tree, chain) = tree_with_chain(2);
        let epoch = tree.gc_epoch();
        tree.remove_child(chain[1], chain[2]).unwrap();
        assert!(tree.is_alive(chain[2]));
        assert!(!tree.is_connected(chain[2]));

        assert_eq!(tree.collect_garbage(), 1);
        assert!(!tree.is_alive(chain[2]));
        assert_eq!(tree.gc_epoch(), epoch + 1);

        // The recycled slot gets a fresh generation.
        let reused = tree.create_element("p");
        assert_eq!(reused.index(), chain[2].index());
        assert_ne!(reused, chain[2]);
    }

    #[test]
    fn test_gc_without_garbage_keeps_epoch() {
        let (mut tree, _) = tree_with_chain(2);
        assert_eq!(tree.collect_garbage(), 0);
        assert_eq!(tree.gc_epoch(), 0);
    }

    #[test]
    fn test_move_emits_remove_and_add() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let x = tree.create_element("x");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        tree.append_child(a, x).unwrap();

        let observer = tree.create_observer();
        tree.observe(observer, root, MutationObserverInit::subtree_child_list()).unwrap();
        tree.append_child(b, x).unwrap();

        let records = tree.take_records(observer);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].removed_nodes, vec![x]);
        assert_eq!(records[1].added_nodes, vec![x]);
        assert_eq!(tree.parent(x), Some(b));
    }

    #[test]
    fn test_disconnect_drops_observer() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let observer = tree.create_observer();
        tree.observe(observer, root, MutationObserverInit::subtree_child_list()).unwrap();
        tree.disconnect(observer);
        let el = tree.create_element("div");
        tree.append_child(root, el).unwrap();
        assert!(!tree.has_pending_records());
        assert!(tree.take_records(observer).is_empty());
    }
}
