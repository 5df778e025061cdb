//! Playback transition handler
//!
//! Visible videos are unmuted and asked to play; hidden ones are paused and
//! muted. A refused play request is logged and otherwise ignored: the next
//! VISIBLE transition tries again.

use std::cell::Cell;
use std::rc::Rc;

use fos_dom::NodeId;
use fos_media::{AutoplayPolicy, HTMLMediaElement, MediaError, PlayPromise};

use crate::visibility::Classification;

/// Apply a classification change to a media element
///
/// Returns the play promise when a play request was issued.
pub fn apply(
    media: &mut HTMLMediaElement,
    classification: Classification,
    policy: AutoplayPolicy,
) -> Option<PlayPromise> {
    match classification {
        Classification::Visible => {
            media.set_muted(false);
            if media.paused {
                Some(media.play(policy))
            } else {
                None
            }
        }
        Classification::Hidden => {
            media.pause();
            // Muted as well, so a missed exit can never leave audio running.
            media.set_muted(true);
            None
        }
    }
}

/// Wait for a play request and log a rejection
///
/// Returns `true` if playback started.
pub async fn watch(target: NodeId, promise: PlayPromise, rejections: Rc<Cell<u64>>) -> bool {
    match promise.settled().await {
        Ok(()) => {
            tracing::trace!("{} playing", target);
            true
        }
        Err(MediaError::NotAllowed(reason)) => {
            tracing::info!("Autoplay was prevented for {}: {}", target, reason);
            rejections.set(rejections.get() + 1);
            false
        }
        Err(err) => {
            tracing::info!("Play request for {} failed: {}", target, err);
            rejections.set(rejections.get() + 1);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_media::MediaKind;

    fn video() -> HTMLMediaElement {
        HTMLMediaElement::with_source(MediaKind::Video, "clip.mp4", 30.0)
    }

    #[test]
    fn test_hidden_pauses_and_mutes() {
        let mut media = video();
        let _ = media.play(AutoplayPolicy::Allowed);
        assert!(apply(&mut media, Classification::Hidden, AutoplayPolicy::Allowed).is_none());
        assert!(media.paused);
        assert!(media.muted);
    }

    #[test]
    fn test_visible_unmutes_and_plays() {
        let mut media = video();
        media.set_muted(true);
        let promise = apply(&mut media, Classification::Visible, AutoplayPolicy::Allowed);
        assert!(!media.muted);
        assert!(!media.paused);
        assert_eq!(promise.and_then(|p| p.try_settled()), Some(Ok(())));
    }

    #[test]
    fn test_visible_while_playing_issues_no_request() {
        let mut media = video();
        let _ = media.play(AutoplayPolicy::Allowed);
        assert!(apply(&mut media, Classification::Visible, AutoplayPolicy::Allowed).is_none());
    }

    #[test]
    fn test_rejection_is_counted_not_raised() {
        let mut media = video();
        let promise = apply(&mut media, Classification::Visible, AutoplayPolicy::AllowedMuted)
            .expect("paused element gets a play request");
        assert!(!media.muted);
        assert!(media.paused);

        let rejections = Rc::new(Cell::new(0));
        let target = NodeId::from_raw_parts(1, 0);
        let started = smol::block_on(watch(target, promise, rejections.clone()));
        assert!(!started);
        assert_eq!(rejections.get(), 1);
    }
}
