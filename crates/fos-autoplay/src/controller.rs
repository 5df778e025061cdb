//! Autoplay Controller
//!
//! Owns one tracker, one registered set and one scanner, and connects them
//! to a document: a mutation subscription feeds the scanner, layout frames
//! feed the tracker, and transitions are applied to the media elements.

use std::cell::Cell;
use std::rc::Rc;

use fos_dom::{Document, MutationObserverInit, NodeId, ObserverId};
use smol::LocalExecutor;

use crate::playback;
use crate::registry::RegisteredSet;
use crate::scanner::{DiscoveryScanner, ScanReport};
use crate::visibility::{
    Classification, IntersectionSource, LayoutIntersection, Transition, VisibilityTracker,
};
use crate::{AutoplayConfig, AutoplayError};

/// Counters for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub scans: u64,
    pub registrations: u64,
    pub transitions: u64,
    pub play_requests: u64,
    pub play_rejections: u64,
    pub pauses: u64,
}

/// Viewport-driven autoplay for one document
pub struct AutoplayController {
    config: AutoplayConfig,
    tracker: VisibilityTracker,
    registered: RegisteredSet,
    scanner: DiscoveryScanner,
    observer: Option<ObserverId>,
    /// Observes play promises; driven by `run_until_stalled`
    executor: LocalExecutor<'static>,
    rejections: Rc<Cell<u64>>,
    stats: PlaybackStats,
}

impl AutoplayController {
    pub fn new(config: AutoplayConfig) -> Result<Self, AutoplayError> {
        config.validate()?;
        Ok(Self {
            tracker: VisibilityTracker::new(config.threshold),
            registered: RegisteredSet::new(),
            scanner: DiscoveryScanner::new(&config.media_tag),
            observer: None,
            executor: LocalExecutor::new(),
            rejections: Rc::new(Cell::new(0)),
            stats: PlaybackStats::default(),
            config,
        })
    }

    pub fn config(&self) -> &AutoplayConfig {
        &self.config
    }

    /// Subscribe to structural changes and run the initial scan
    pub fn attach(&mut self, document: &mut Document) -> Result<ScanReport, AutoplayError> {
        if self.observer.is_some() {
            return Err(AutoplayError::AlreadyAttached);
        }

        let target = if document.body().is_valid() {
            document.body()
        } else {
            tracing::warn!("{} has no <body>; observing the whole document", document.url());
            document.tree().root()
        };

        let tree = document.tree_mut();
        let observer = tree.create_observer();
        let options = MutationObserverInit::subtree_child_list();
        if let Err(err) = tree.observe(observer, target, options) {
            tree.disconnect(observer);
            return Err(err.into());
        }
        self.observer = Some(observer);

        let report = self.scan(document);
        tracing::info!(
            "Autoplay attached to {} ({} <{}> elements)",
            document.url(),
            report.found,
            self.config.media_tag
        );
        Ok(report)
    }

    /// Handle the pending mutation batch
    ///
    /// Returns `None` when nothing changed since the last call.
    pub fn on_mutations(&mut self, document: &mut Document) -> Option<ScanReport> {
        let observer = self.observer?;
        let records = document.tree_mut().take_records(observer);
        if records.is_empty() {
            return None;
        }

        if self.config.coalesce_mutations {
            return Some(self.scan(document));
        }

        let mut merged = ScanReport::default();
        for _ in &records {
            let report = self.scan(document);
            merged.found = report.found;
            merged.registered.extend(report.registered);
        }
        Some(merged)
    }

    /// Handle a layout/scroll frame against the document viewport
    ///
    /// Returns the number of transitions applied.
    pub fn on_frame(&mut self, document: &mut Document) -> usize {
        let transitions = {
            let source = LayoutIntersection::new(document, self.config.root_margin);
            self.tracker.update(&source)
        };
        self.dispatch(document, transitions)
    }

    /// Handle a frame using ratios from an arbitrary source
    pub fn deliver(&mut self, document: &mut Document, source: &impl IntersectionSource) -> usize {
        let transitions = self.tracker.update(source);
        self.dispatch(document, transitions)
    }

    /// Settle whatever play requests are ready
    ///
    /// Returns the number of executor steps taken.
    pub fn run_until_stalled(&self) -> usize {
        let mut steps = 0;
        while self.executor.try_tick() {
            steps += 1;
        }
        steps
    }

    pub fn is_registered(&self, target: NodeId) -> bool {
        self.registered.contains(target)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn classification(&self, target: NodeId) -> Option<Classification> {
        self.tracker.classification(target)
    }

    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            play_rejections: self.rejections.get(),
            ..self.stats
        }
    }

    fn scan(&mut self, document: &Document) -> ScanReport {
        let report = self.scanner.scan(document, &mut self.registered, &mut self.tracker);
        self.stats.scans = self.scanner.scans();
        self.stats.registrations += report.registered.len() as u64;
        report
    }

    fn dispatch(&mut self, document: &mut Document, transitions: Vec<Transition>) -> usize {
        let policy = document.autoplay_policy();
        let count = transitions.len();

        for transition in transitions {
            self.stats.transitions += 1;
            let Some(media) = document.tree_mut().media_mut(transition.target) else {
                tracing::trace!("{} is not a media element; ignoring", transition.target);
                continue;
            };

            tracing::debug!(
                "{} {:?} (ratio {:.2}{})",
                transition.target,
                transition.classification,
                transition.ratio,
                if transition.initial { ", initial" } else { "" }
            );

            if transition.classification == Classification::Hidden {
                self.stats.pauses += 1;
            }
            if let Some(promise) = playback::apply(media, transition.classification, policy) {
                self.stats.play_requests += 1;
                let rejections = Rc::clone(&self.rejections);
                self.executor
                    .spawn(playback::watch(transition.target, promise, rejections))
                    .detach();
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::DOMRect;

    fn feed_page() -> (Document, NodeId) {
        let mut doc = Document::new("https://example.com/feed");
        doc.resize(800.0, 600.0);
        let body = doc.body();
        let video = doc.append_element(body, "video").unwrap();
        doc.tree.set_layout_rect(video, DOMRect::new(0.0, 100.0, 640.0, 360.0)).unwrap();
        if let Some(media) = doc.tree.media_mut(video) {
            media.set_ready_state(fos_media::ReadyState::HaveEnoughData);
        }
        (doc, video)
    }

    #[test]
    fn test_attach_scans_once() {
        let (mut doc, video) = feed_page();
        let mut controller = AutoplayController::new(AutoplayConfig::default()).unwrap();
        let report = controller.attach(&mut doc).unwrap();
        assert_eq!(report.registered, vec![video]);
        assert!(controller.is_registered(video));
        assert!(matches!(controller.attach(&mut doc), Err(AutoplayError::AlreadyAttached)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AutoplayConfig {
            threshold: 2.0,
            ..Default::default()
        };
        assert!(AutoplayController::new(config).is_err());
    }

    #[test]
    fn test_on_mutations_without_changes() {
        let (mut doc, _) = feed_page();
        let mut controller = AutoplayController::new(AutoplayConfig::default()).unwrap();
        assert!(controller.on_mutations(&mut doc).is_none());
        controller.attach(&mut doc).unwrap();
        assert!(controller.on_mutations(&mut doc).is_none());
    }

    #[test]
    fn test_on_screen_video_plays_after_gesture() {
        let (mut doc, video) = feed_page();
        doc.activate();
        let mut controller = AutoplayController::new(AutoplayConfig::default()).unwrap();
        controller.attach(&mut doc).unwrap();

        assert_eq!(controller.on_frame(&mut doc), 1);
        controller.run_until_stalled();

        let media = doc.tree.media(video).unwrap();
        assert!(media.is_playing());
        assert!(!media.muted);
        assert_eq!(controller.stats().play_rejections, 0);
    }

    #[test]
    fn test_blocked_autoplay_is_counted() {
        let (mut doc, video) = feed_page();
        let mut controller = AutoplayController::new(AutoplayConfig::default()).unwrap();
        controller.attach(&mut doc).unwrap();
        controller.on_frame(&mut doc);
        controller.run_until_stalled();

        let media = doc.tree.media(video).unwrap();
        assert!(media.paused);
        assert!(!media.muted);
        let stats = controller.stats();
        assert_eq!(stats.play_requests, 1);
        assert_eq!(stats.play_rejections, 1);
    }

    #[test]
    fn test_uncoalesced_scans_per_record() {
        let (mut doc, _) = feed_page();
        let config = AutoplayConfig {
            coalesce_mutations: false,
            ..Default::default()
        };
        let mut controller = AutoplayController::new(config).unwrap();
        controller.attach(&mut doc).unwrap();

        let body = doc.body();
        doc.append_element(body, "div").unwrap();
        let v = doc.append_element(body, "video").unwrap();
        let report = controller.on_mutations(&mut doc).unwrap();
        assert_eq!(report.registered, vec![v]);
        assert_eq!(controller.stats().scans, 3);
    }
}
