//! Mutation Observer API
//!
//! Observers are owned by the [`DomTree`](crate::DomTree) they watch. Tree
//! mutations queue records on every observer whose observation covers the
//! mutated node; the host drains them in batches with
//! [`DomTree::take_records`](crate::DomTree::take_records).

use crate::NodeId;

/// Observer handle, unique within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling,
            next_sibling,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Structural changes anywhere below the target
    pub fn subtree_child_list() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                self.attributes
                    && match (&self.attribute_filter, &record.attribute_name) {
                        (Some(filter), Some(name)) => filter.contains(name),
                        _ => true,
                    }
            }
        }
    }
}

/// Mutation observer
#[derive(Debug)]
pub struct MutationObserver {
    id: ObserverId,
    observations: Vec<(NodeId, MutationObserverInit)>,
    pending_records: Vec<MutationRecord>,
}

impl MutationObserver {
    pub(crate) fn new(id: ObserverId) -> Self {
        Self {
            id,
            observations: Vec::new(),
            pending_records: Vec::new(),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Observe a target, replacing any earlier options for it
    pub(crate) fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        match self.observations.iter_mut().find(|(t, _)| *t == target) {
            Some(entry) => entry.1 = options,
            None => self.observations.push((target, options)),
        }
    }

    /// Take pending records
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending_records)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_records.is_empty()
    }

    /// Queue `record` if any observation covers it.
    ///
    /// `ancestors` is the inclusive ancestor chain of the record target.
    pub(crate) fn record(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
        let covered = self.observations.iter().any(|(target, options)| {
            let in_scope = if options.subtree {
                ancestors.contains(target)
            } else {
                *target == record.target
            };
            in_scope && options.wants(record)
        });

        if covered {
            let mut record = record.clone();
            if record.mutation_type == MutationType::Attributes
                && !self.keeps_old_value(record.target, ancestors)
            {
                record.old_value = None;
            }
            self.pending_records.push(record);
        }
    }

    fn keeps_old_value(&self, target: NodeId, ancestors: &[NodeId]) -> bool {
        self.observations.iter().any(|(t, options)| {
            options.attribute_old_value
                && (*t == target || (options.subtree && ancestors.contains(t)))
        })
    }
}
