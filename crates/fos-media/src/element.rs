//! Media Elements
//!
//! Playback and audio state shared by `<video>` and `<audio>`.

use crate::policy::AutoplayPolicy;
use crate::promise::{self, PlayPromise, PlaySettler};
use crate::MediaError;

/// Which element the state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Network state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkState {
    #[default]
    Empty = 0,
    Idle = 1,
    Loading = 2,
    NoSource = 3,
}

/// Ready state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// Base media element (shared between video/audio)
#[derive(Debug)]
pub struct HTMLMediaElement {
    pub kind: MediaKind,
    pub src: String,

    // State
    pub network_state: NetworkState,
    pub ready_state: ReadyState,

    // Playback
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub ended: bool,
    pub autoplay: bool,
    pub loop_: bool,

    // Volume
    pub volume: f64,
    pub muted: bool,

    /// Play requests waiting for enough data
    pending_play: Vec<PlaySettler>,
}

impl HTMLMediaElement {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            src: String::new(),
            network_state: NetworkState::Empty,
            ready_state: ReadyState::HaveNothing,
            current_time: 0.0,
            duration: f64::NAN,
            paused: true,
            ended: false,
            autoplay: false,
            loop_: false,
            volume: 1.0,
            muted: false,
            pending_play: Vec::new(),
        }
    }

    /// Element with a source that has finished loading
    pub fn with_source(kind: MediaKind, src: &str, duration: f64) -> Self {
        let mut media = Self::new(kind);
        media.src = src.to_string();
        media.duration = duration;
        media.network_state = NetworkState::Idle;
        media.ready_state = ReadyState::HaveEnoughData;
        media
    }

    /// Is the element producing output right now
    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended && self.ready_state >= ReadyState::HaveFutureData
    }

    /// Number of play requests still waiting to settle
    pub fn pending_play_count(&self) -> usize {
        self.pending_play.len()
    }

    /// Request playback
    ///
    /// Rejected with `NotAllowed` when `policy` forbids playback with the
    /// current audio state. Otherwise the element leaves the paused state and
    /// the promise resolves once enough data is buffered.
    pub fn play(&mut self, policy: AutoplayPolicy) -> PlayPromise {
        if self.network_state == NetworkState::NoSource {
            return PlayPromise::rejected(MediaError::NotSupported(
                "no supported source".into(),
            ));
        }
        if !policy.permits(self.muted) {
            tracing::debug!(
                "play() blocked by autoplay policy {:?} (muted: {})",
                policy,
                self.muted
            );
            return PlayPromise::rejected(MediaError::NotAllowed(
                "play() requires a user gesture".into(),
            ));
        }

        if self.ended && !self.loop_ {
            self.current_time = 0.0;
        }
        self.paused = false;
        self.ended = false;

        if self.ready_state >= ReadyState::HaveFutureData {
            PlayPromise::resolved()
        } else {
            let (settler, promise) = promise::pending();
            self.pending_play.push(settler);
            promise
        }
    }

    /// Pause media, aborting any play request still waiting for data
    pub fn pause(&mut self) {
        self.paused = true;
        for settler in self.pending_play.drain(..) {
            settler.reject(MediaError::Aborted);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Update the ready state as data arrives
    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
        if state >= ReadyState::HaveMetadata && self.network_state != NetworkState::NoSource {
            self.network_state = NetworkState::Idle;
        }
        if state >= ReadyState::HaveFutureData && !self.paused {
            for settler in self.pending_play.drain(..) {
                settler.resolve();
            }
        }
    }

    /// Mark the source as unusable; pending plays are rejected
    pub fn fail_source(&mut self) {
        self.network_state = NetworkState::NoSource;
        for settler in self.pending_play.drain(..) {
            settler.reject(MediaError::NotSupported("source failed to load".into()));
        }
    }

    /// Load media
    pub fn load(&mut self, src: &str) {
        self.pause();
        self.src = src.to_string();
        self.network_state = NetworkState::Loading;
        self.ready_state = ReadyState::HaveNothing;
        self.current_time = 0.0;
        self.ended = false;
    }

    /// Advance the playback clock by `seconds` of wall time
    pub fn advance(&mut self, seconds: f64) {
        if !self.is_playing() {
            return;
        }
        self.current_time += seconds;
        if self.duration.is_finite() && self.current_time >= self.duration {
            if self.loop_ {
                self.current_time %= self.duration.max(f64::EPSILON);
            } else {
                self.current_time = self.duration;
                self.ended = true;
                self.paused = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> HTMLMediaElement {
        HTMLMediaElement::with_source(MediaKind::Video, "clip.mp4", 10.0)
    }

    #[test]
    fn test_new_element_is_paused() {
        let media = HTMLMediaElement::new(MediaKind::Video);
        assert!(media.paused);
        assert!(!media.muted);
        assert_eq!(media.volume, 1.0);
    }

    #[test]
    fn test_unmuted_play_blocked_without_gesture() {
        let mut media = video();
        let promise = media.play(AutoplayPolicy::AllowedMuted);
        assert!(media.paused);
        assert!(matches!(promise.try_settled(), Some(Err(MediaError::NotAllowed(_)))));
    }

    #[test]
    fn test_muted_play_allowed() {
        let mut media = video();
        media.set_muted(true);
        let promise = media.play(AutoplayPolicy::AllowedMuted);
        assert!(!media.paused);
        assert_eq!(promise.try_settled(), Some(Ok(())));
    }

    #[test]
    fn test_play_waits_for_data() {
        let mut media = HTMLMediaElement::new(MediaKind::Video);
        media.load("slow.mp4");
        let promise = media.play(AutoplayPolicy::Allowed);
        assert!(!media.paused);
        assert_eq!(promise.try_settled(), None);
        assert_eq!(media.pending_play_count(), 1);

        media.set_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(promise.try_settled(), Some(Ok(())));
        assert!(media.is_playing());
    }

    #[test]
    fn test_pause_aborts_pending_play() {
        let mut media = HTMLMediaElement::new(MediaKind::Video);
        let promise = media.play(AutoplayPolicy::Allowed);
        media.pause();
        assert_eq!(smol::block_on(promise.settled()), Err(MediaError::Aborted));
        assert_eq!(media.pending_play_count(), 0);
    }

    #[test]
    fn test_failed_source_rejects() {
        let mut media = HTMLMediaElement::new(MediaKind::Video);
        let pending = media.play(AutoplayPolicy::Allowed);
        media.fail_source();
        assert!(matches!(pending.try_settled(), Some(Err(MediaError::NotSupported(_)))));
        let later = media.play(AutoplayPolicy::Allowed);
        assert!(matches!(later.try_settled(), Some(Err(MediaError::NotSupported(_)))));
    }

    #[test]
    fn test_advance_and_end() {
        let mut media = video();
        media.advance(1.0);
        assert_eq!(media.current_time, 0.0);

        let _ = media.play(AutoplayPolicy::Allowed);
        media.advance(4.0);
        assert_eq!(media.current_time, 4.0);
        media.advance(10.0);
        assert!(media.ended);
        assert!(media.paused);
        assert_eq!(media.current_time, 10.0);

        let _ = media.play(AutoplayPolicy::Allowed);
        assert_eq!(media.current_time, 0.0);
    }
}
