//! Document - High-level document API

use fos_media::AutoplayPolicy;

use crate::{DOMRect, DomError, DomTree, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    /// Visible scrolling region, in document coordinates
    viewport: DOMRect,
    /// Sticky user activation (set by the first user gesture)
    user_activated: bool,
    /// Policy applied before any user gesture
    base_policy: AutoplayPolicy,
}

impl Document {
    /// Create a new document with an html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let mut doc = Self::empty(url);
        // Freshly created nodes under the root cannot fail to link.
        if tree.append_child(root, html).is_ok()
            && tree.append_child(html, head).is_ok()
            && tree.append_child(html, body).is_ok()
        {
            doc.html_element = html;
            doc.head_element = head;
            doc.body_element = body;
        }
        doc.tree = tree;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            viewport: DOMRect::new(0.0, 0.0, 1280.0, 720.0),
            user_activated: false,
            base_policy: AutoplayPolicy::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element (NONE for an empty document)
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, local_name: &str) -> Result<NodeId, DomError> {
        let el = self.tree.create_element(local_name);
        self.tree.append_child(parent, el)?;
        Ok(el)
    }

    /// All connected elements with the given tag, in tree order
    pub fn elements_by_tag_name(&self, local_name: &str) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| {
                self.tree
                    .get(id)
                    .and_then(|n| n.as_element())
                    .is_some_and(|e| e.has_local_name(local_name))
            })
            .collect()
    }

    /// Get element by `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.descendants(self.tree.root()).find(|&node| {
            self.tree
                .get(node)
                .and_then(|n| n.as_element())
                .and_then(|e| e.get_attr("id"))
                == Some(id)
        })
    }

    pub fn viewport(&self) -> DOMRect {
        self.viewport
    }

    /// Scroll the viewport to a document position
    pub fn scroll_to(&mut self, x: f32, y: f32) {
        self.viewport.x = x;
        self.viewport.y = y;
    }

    /// Scroll the viewport by a delta
    pub fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.scroll_to(self.viewport.x + dx, self.viewport.y + dy);
    }

    /// Resize the viewport, keeping its scroll position
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Record a user gesture (click, key press)
    pub fn activate(&mut self) {
        if !self.user_activated {
            tracing::debug!("User activation recorded for {}", self.url);
        }
        self.user_activated = true;
    }

    pub fn has_user_activation(&self) -> bool {
        self.user_activated
    }

    /// Override the policy used before user activation
    pub fn set_base_autoplay_policy(&mut self, policy: AutoplayPolicy) {
        self.base_policy = policy;
    }

    /// Autoplay policy currently in force for media in this document
    pub fn autoplay_policy(&self) -> AutoplayPolicy {
        if self.user_activated && self.base_policy != AutoplayPolicy::Disallowed {
            AutoplayPolicy::Allowed
        } else {
            self.base_policy
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
