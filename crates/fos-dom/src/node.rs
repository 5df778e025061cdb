//! DOM Node
//!
//! Nodes link to each other through `NodeId`s (index + generation) rather
//! than pointers, so the arena can recycle slots without dangling links.

use fos_media::{HTMLMediaElement, MediaKind};

use crate::{DOMRect, NodeId};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if root or detached)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Border box from the last layout pass, in document coordinates
    pub layout: Option<DOMRect>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            layout: None,
            data,
        }
    }

    /// Create a new element node
    ///
    /// `video` and `audio` elements get media state attached.
    pub fn element(local_name: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(local_name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercased local name
    pub local_name: String,
    pub attrs: Vec<Attribute>,
    /// Playback state for `video`/`audio` elements
    pub media: Option<HTMLMediaElement>,
}

impl ElementData {
    pub fn new(local_name: &str) -> Self {
        let local_name = local_name.to_ascii_lowercase();
        let media = match local_name.as_str() {
            "video" => Some(HTMLMediaElement::new(MediaKind::Video)),
            "audio" => Some(HTMLMediaElement::new(MediaKind::Audio)),
            _ => None,
        };
        Self {
            local_name,
            attrs: Vec::new(),
            media,
        }
    }

    /// Check the tag name, ASCII case-insensitively
    pub fn has_local_name(&self, name: &str) -> bool {
        self.local_name.eq_ignore_ascii_case(name)
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            return Some(std::mem::replace(&mut attr.value, value.to_string()));
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        None
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_gets_media_state() {
        let node = Node::element("VIDEO");
        let elem = node.as_element().unwrap();
        assert_eq!(elem.local_name, "video");
        assert!(elem.media.is_some());
        assert!(Node::element("div").as_element().unwrap().media.is_none());
    }

    #[test]
    fn test_set_attr_returns_old_value() {
        let mut elem = ElementData::new("div");
        assert_eq!(elem.set_attr("class", "a"), None);
        assert_eq!(elem.set_attr("class", "b"), Some("a".to_string()));
        assert_eq!(elem.get_attr("class"), Some("b"));
    }
}
