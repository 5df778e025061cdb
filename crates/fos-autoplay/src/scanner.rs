//! Discovery Scanner
//!
//! Finds the managed media elements in a document and registers each one
//! exactly once, no matter how often it runs.

use fos_dom::{Document, NodeId};

use crate::registry::RegisteredSet;
use crate::visibility::VisibilityTracker;

/// Receiver of newly discovered elements
pub trait Registrar {
    fn register(&mut self, target: NodeId);
}

impl Registrar for VisibilityTracker {
    fn register(&mut self, target: NodeId) {
        VisibilityTracker::register(self, target);
    }
}

/// Result of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Matching elements present in the document
    pub found: usize,
    /// Elements registered by this scan, in tree order
    pub registered: Vec<NodeId>,
}

/// Scanner for one tag name
#[derive(Debug)]
pub struct DiscoveryScanner {
    media_tag: String,
    scans: u64,
}

impl DiscoveryScanner {
    pub fn new(media_tag: &str) -> Self {
        Self {
            media_tag: media_tag.to_ascii_lowercase(),
            scans: 0,
        }
    }

    /// Number of scans run so far
    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Register every connected match that is not in `registered` yet
    ///
    /// Already registered elements are left untouched.
    pub fn scan(
        &mut self,
        document: &Document,
        registered: &mut RegisteredSet,
        registrar: &mut impl Registrar,
    ) -> ScanReport {
        self.scans += 1;
        registered.sweep(document.tree());

        let matches = document.elements_by_tag_name(&self.media_tag);
        let mut report = ScanReport {
            found: matches.len(),
            registered: Vec::new(),
        };
        for id in matches {
            if registered.insert(id) {
                registrar.register(id);
                report.registered.push(id);
            }
        }

        if report.registered.is_empty() {
            tracing::trace!("Scan {}: no new <{}> elements", self.scans, self.media_tag);
        } else {
            tracing::debug!(
                "Scan {}: registered {} of {} <{}> elements",
                self.scans,
                report.registered.len(),
                report.found,
                self.media_tag
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingRegistrar {
        calls: HashMap<NodeId, usize>,
    }

    impl Registrar for CountingRegistrar {
        fn register(&mut self, target: NodeId) {
            *self.calls.entry(target).or_default() += 1;
        }
    }

    #[test]
    fn test_repeated_scans_register_once() {
        let mut doc = Document::default();
        let body = doc.body();
        let a = doc.append_element(body, "video").unwrap();
        let b = doc.append_element(body, "video").unwrap();
        doc.append_element(body, "img").unwrap();

        let mut scanner = DiscoveryScanner::new("video");
        let mut registered = RegisteredSet::new();
        let mut registrar = CountingRegistrar::default();

        let first = scanner.scan(&doc, &mut registered, &mut registrar);
        assert_eq!(first.registered, vec![a, b]);
        for _ in 0..10 {
            let report = scanner.scan(&doc, &mut registered, &mut registrar);
            assert_eq!(report.found, 2);
            assert!(report.registered.is_empty());
        }

        assert_eq!(registrar.calls[&a], 1);
        assert_eq!(registrar.calls[&b], 1);
        assert_eq!(scanner.scans(), 11);
    }

    #[test]
    fn test_scan_ignores_detached() {
        let mut doc = Document::default();
        let detached = doc.tree.create_element("video");
        let mut scanner = DiscoveryScanner::new("video");
        let mut registered = RegisteredSet::new();
        let mut tracker = VisibilityTracker::new(0.7);

        let report = scanner.scan(&doc, &mut registered, &mut tracker);
        assert_eq!(report.found, 0);

        let body = doc.body();
        doc.tree.append_child(body, detached).unwrap();
        let report = scanner.scan(&doc, &mut registered, &mut tracker);
        assert_eq!(report.registered, vec![detached]);
        assert!(tracker.is_tracked(detached));
    }

    #[test]
    fn test_reinserted_element_not_reregistered() {
        let mut doc = Document::default();
        let body = doc.body();
        let video = doc.append_element(body, "video").unwrap();
        let mut scanner = DiscoveryScanner::new("video");
        let mut registered = RegisteredSet::new();
        let mut registrar = CountingRegistrar::default();
        scanner.scan(&doc, &mut registered, &mut registrar);

        doc.tree.remove_child(body, video).unwrap();
        scanner.scan(&doc, &mut registered, &mut registrar);
        doc.tree.append_child(body, video).unwrap();
        scanner.scan(&doc, &mut registered, &mut registrar);

        assert_eq!(registrar.calls[&video], 1);
    }
}
