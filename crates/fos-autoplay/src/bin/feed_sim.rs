//! fOS Feed Simulator
//!
//! Scrolls through an infinite feed of video posts and lets the autoplay
//! controller react, logging what happens on each frame.
//!
//! Usage: `fos-feed-sim [posts]` (set `RUST_LOG=debug` for per-video detail)

use anyhow::{Context, Result};
use fos_autoplay::{AutoplayConfig, AutoplayController};
use fos_dom::{DOMRect, Document, NodeId};
use fos_media::ReadyState;
use tracing_subscriber::EnvFilter;

const POST_HEIGHT: f32 = 480.0;
const VIDEO_HEIGHT: f32 = 360.0;
const SCROLL_STEP: f32 = 240.0;
const FRAME_SECONDS: f64 = 0.25;
/// Frame on which the simulated reader taps the page
const GESTURE_FRAME: usize = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let posts: usize = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()
        .context("post count must be a positive number")?
        .unwrap_or(12);

    let mut doc = Document::new("https://feed.example/");
    doc.resize(1280.0, 720.0);
    let body = doc.body();
    let feed = doc.append_element(body, "main")?;

    let mut appended = 0;
    while appended < posts.min(3) {
        append_post(&mut doc, feed, appended)?;
        appended += 1;
    }

    let mut controller = AutoplayController::new(AutoplayConfig::default())?;
    controller.attach(&mut doc)?;

    let frames = posts * 2;
    for frame in 0..frames {
        if frame == GESTURE_FRAME {
            tracing::info!("Reader tapped the page");
            doc.activate();
        }

        // Lazy-load posts so two are always waiting below the fold.
        let horizon = doc.viewport().bottom() + 2.0 * POST_HEIGHT;
        while appended < posts && (appended as f32) * POST_HEIGHT < horizon {
            append_post(&mut doc, feed, appended)?;
            appended += 1;
        }

        if let Some(report) = controller.on_mutations(&mut doc) {
            if !report.registered.is_empty() {
                let count = report.registered.len();
                tracing::info!("Frame {}: discovered {} new videos", frame, count);
            }
        }
        controller.on_frame(&mut doc);
        controller.run_until_stalled();

        let mut playing = Vec::new();
        for video in doc.elements_by_tag_name("video") {
            if let Some(media) = doc.tree.media_mut(video) {
                media.advance(FRAME_SECONDS);
                if media.is_playing() {
                    playing.push(video.to_string());
                }
            }
        }
        tracing::info!(
            "Frame {} at y={}: playing [{}]",
            frame,
            doc.viewport().y,
            playing.join(", ")
        );

        doc.scroll_by(0.0, SCROLL_STEP);
    }

    let stats = controller.stats();
    tracing::info!(
        "Done: {} scans, {} videos, {} transitions, {} play requests ({} refused), {} pauses",
        stats.scans,
        stats.registrations,
        stats.transitions,
        stats.play_requests,
        stats.play_rejections,
        stats.pauses
    );
    Ok(())
}

/// Append `article > div > div > figure > video` at the feed position for `index`
fn append_post(doc: &mut Document, feed: NodeId, index: usize) -> Result<NodeId> {
    let article = doc.append_element(feed, "article")?;
    let frame = doc.append_element(article, "div")?;
    let player = doc.append_element(frame, "div")?;
    let figure = doc.append_element(player, "figure")?;
    let video = doc.append_element(figure, "video")?;

    let top = index as f32 * POST_HEIGHT;
    doc.tree.set_layout_rect(article, DOMRect::new(0.0, top, 640.0, POST_HEIGHT))?;
    doc.tree.set_layout_rect(video, DOMRect::new(0.0, top + 60.0, 640.0, VIDEO_HEIGHT))?;

    let media = doc
        .tree
        .media_mut(video)
        .context("video element without media state")?;
    media.load(&format!("https://feed.example/clips/{index}.mp4"));
    media.duration = 15.0;
    media.loop_ = true;
    media.set_ready_state(ReadyState::HaveEnoughData);

    Ok(video)
}
