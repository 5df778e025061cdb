//! Visibility Tracker
//!
//! Per-element state machine over {VISIBLE, HIDDEN}, driven by intersection
//! ratios pulled from an [`IntersectionSource`]. Only threshold crossings
//! produce transitions; ratio changes on the same side are absorbed.

use std::collections::HashMap;

use fos_dom::{DOMRect, Document, DomTree, NodeId};

/// Visibility classification of a tracked element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Visible,
    Hidden,
}

impl Classification {
    /// Classify a ratio; the threshold itself counts as visible
    #[inline]
    pub fn from_ratio(ratio: f32, threshold: f32) -> Self {
        if ratio >= threshold {
            Classification::Visible
        } else {
            Classification::Hidden
        }
    }
}

/// A classification change for one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub target: NodeId,
    pub classification: Classification,
    /// Ratio sample that caused the change
    pub ratio: f32,
    /// First classification after registration
    pub initial: bool,
}

/// Supplier of intersection ratios
pub trait IntersectionSource {
    /// Current ratio of `target` against the root, `None` when the target is
    /// detached or has no layout box
    fn intersection_ratio(&self, target: NodeId) -> Option<f32>;

    /// `false` once the target has been reclaimed for good
    fn is_alive(&self, _target: NodeId) -> bool {
        true
    }
}

/// Synthetic ratios, keyed by element
impl IntersectionSource for HashMap<NodeId, f32> {
    fn intersection_ratio(&self, target: NodeId) -> Option<f32> {
        self.get(&target).copied()
    }
}

/// Ratios computed from layout boxes against the document viewport
#[derive(Debug)]
pub struct LayoutIntersection<'a> {
    tree: &'a DomTree,
    root: DOMRect,
}

impl<'a> LayoutIntersection<'a> {
    pub fn new(document: &'a Document, root_margin: f32) -> Self {
        Self {
            tree: document.tree(),
            root: document.viewport().inflate(root_margin),
        }
    }

    pub fn root(&self) -> DOMRect {
        self.root
    }
}

impl IntersectionSource for LayoutIntersection<'_> {
    fn intersection_ratio(&self, target: NodeId) -> Option<f32> {
        if !self.tree.is_connected(target) {
            return None;
        }
        self.tree
            .layout_rect(target)
            .map(|rect| rect.intersection_ratio(&self.root))
    }

    fn is_alive(&self, target: NodeId) -> bool {
        self.tree.is_alive(target)
    }
}

#[derive(Debug)]
struct TrackedTarget {
    target: NodeId,
    state: Option<Classification>,
}

/// Tracks the visibility classification of registered elements
#[derive(Debug)]
pub struct VisibilityTracker {
    threshold: f32,
    targets: Vec<TrackedTarget>,
    /// Position of each target in `targets`
    index: HashMap<NodeId, usize>,
}

impl VisibilityTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            targets: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Begin tracking `target`
    ///
    /// Returns `false` (and changes nothing) when it is already tracked.
    pub fn register(&mut self, target: NodeId) -> bool {
        if self.index.contains_key(&target) {
            return false;
        }
        self.index.insert(target, self.targets.len());
        self.targets.push(TrackedTarget {
            target,
            state: None,
        });
        true
    }

    pub fn is_tracked(&self, target: NodeId) -> bool {
        self.index.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Last classification, `None` before the first sample
    pub fn classification(&self, target: NodeId) -> Option<Classification> {
        let &position = self.index.get(&target)?;
        self.targets[position].state
    }

    /// Sample every tracked element once and collect the crossings
    ///
    /// An element without a sample keeps its state until it has been
    /// classified at least once; after that a missing sample reads as 0.
    pub fn update(&mut self, source: &impl IntersectionSource) -> Vec<Transition> {
        let before = self.targets.len();
        self.targets.retain(|t| source.is_alive(t.target));
        if self.targets.len() != before {
            self.index = self
                .targets
                .iter()
                .enumerate()
                .map(|(position, t)| (t.target, position))
                .collect();
        }

        let mut transitions = Vec::new();
        for tracked in &mut self.targets {
            let ratio = match (source.intersection_ratio(tracked.target), tracked.state) {
                (Some(ratio), _) => ratio,
                (None, Some(_)) => 0.0,
                (None, None) => continue,
            };

            let next = Classification::from_ratio(ratio, self.threshold);
            if tracked.state == Some(next) {
                continue;
            }

            tracing::trace!("{} -> {:?} at ratio {:.3}", tracked.target, next, ratio);
            transitions.push(Transition {
                target: tracked.target,
                classification: next,
                ratio,
                initial: tracked.state.is_none(),
            });
            tracked.state = Some(next);
        }
        transitions
    }
}
